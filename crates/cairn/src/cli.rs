use clap::{Parser, Subcommand, ValueEnum};
use libcairn_core::ObjectKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cairn", about = "Content-addressable version-control storage", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new, empty repository
    Init {
        /// Where to create the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the raw contents of a stored object
    CatFile {
        /// Expected object type
        kind: KindArg,

        /// Object name (hash, short hash, tag, branch, or HEAD)
        object: String,
    },

    /// Hash a file into an object, optionally storing it
    HashObject {
        /// Object type
        #[arg(short = 't', long = "type", value_enum, default_value = "blob")]
        kind: KindArg,

        /// Write the object into the store instead of just hashing
        #[arg(short, long)]
        write: bool,

        path: PathBuf,
    },

    /// Show the commit history starting from a commit
    Log {
        #[arg(default_value = "HEAD")]
        commit: String,

        /// Stop after this many commits
        #[arg(short = 'n', long)]
        max_count: Option<usize>,
    },

    /// List the contents of a tree object
    LsTree {
        /// Recurse into subtrees
        #[arg(short, long)]
        recursive: bool,

        tree: String,
    },

    /// Materialize a commit's tree into an empty directory
    Checkout {
        commit: String,

        /// Destination: absent (created) or an empty directory
        path: PathBuf,
    },

    /// List references and their targets
    ShowRef,

    /// List tags, or create one
    Tag {
        /// Create an annotated tag object
        #[arg(short = 'a', long = "annotate")]
        annotate: bool,

        /// Message for the annotated tag
        #[arg(short, long)]
        message: Option<String>,

        /// Tag name; with no name, list existing tags
        name: Option<String>,

        /// What the tag points at
        #[arg(default_value = "HEAD")]
        object: String,
    },

    /// Resolve a name to a full object hash
    RevParse {
        /// Peel the result to this object type
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,

        name: String,
    },

    /// List staged files
    LsFiles {
        /// Show entry metadata as well
        #[arg(long)]
        verbose: bool,
    },

    /// Report which of the given paths are ignored
    CheckIgnore {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Summarize branch state, staged, and unstaged changes
    Status,

    /// Stage files
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove files from the index and the working tree
    Rm {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Record the staged tree as a new commit
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Blob,
    Commit,
    Tag,
    Tree,
}

impl From<KindArg> for ObjectKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Blob => ObjectKind::Blob,
            KindArg::Commit => ObjectKind::Commit,
            KindArg::Tag => ObjectKind::Tag,
            KindArg::Tree => ObjectKind::Tree,
        }
    }
}
