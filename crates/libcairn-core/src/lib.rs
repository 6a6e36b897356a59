pub mod checkout;
pub mod config;
pub mod error;
pub mod ignore;
pub mod index;
pub mod kvlm;
pub mod object;
pub mod refs;
pub mod repo;
pub mod store;
pub mod tree;

pub use checkout::checkout;
pub use config::{load_repo_config, save_repo_config, RepoConfig, UserConfig};
pub use error::CairnError;
pub use index::{Index, IndexEntry};
pub use kvlm::Kvlm;
pub use object::{Object, ObjectKind};
pub use repo::Repository;
pub use store::ObjectStore;
pub use tree::{Tree, TreeEntry};
