//! End-to-end exercise of the storage engine: stage, build trees, commit,
//! resolve, and check out through a real filesystem repository.

use libcairn_core::{
    checkout::checkout,
    index::{self, Index},
    kvlm::Kvlm,
    object::{Object, ObjectKind},
    refs,
    repo::Repository,
    store::ObjectStore,
    tree,
};
use tempfile::tempdir;

fn commit_object(tree_sha: &str, parent: Option<&str>, message: &str) -> Object {
    let mut body = Kvlm::new();
    body.push(b"tree".to_vec(), tree_sha.as_bytes().to_vec());
    if let Some(parent) = parent {
        body.push(b"parent".to_vec(), parent.as_bytes().to_vec());
    }
    let ident = b"Test <test@example.com> 1700000000 +0000".to_vec();
    body.push(b"author".to_vec(), ident.clone());
    body.push(b"committer".to_vec(), ident);
    body.set_message(format!("{}\n", message).into_bytes());
    Object::Commit(body)
}

#[test]
fn stage_commit_resolve_checkout_cycle() {
    let dir = tempdir().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let store = ObjectStore::open(&repo);

    std::fs::write(repo.worktree().join("a.txt"), b"alpha\n").unwrap();
    std::fs::create_dir(repo.worktree().join("docs")).unwrap();
    std::fs::write(repo.worktree().join("docs/guide.md"), b"# guide\n").unwrap();

    let mut index = Index::default();
    index::stage_file(&repo, &store, &mut index, "a.txt").unwrap();
    index::stage_file(&repo, &store, &mut index, "docs/guide.md").unwrap();
    index.write(&repo).unwrap();

    // The index survives a filesystem round trip untouched.
    assert_eq!(Index::read(&repo).unwrap(), index);

    let root = index::build_tree(&store, &index).unwrap();
    let commit_sha = store.write(&commit_object(&root, None, "initial")).unwrap();
    refs::update_head(&repo, &commit_sha).unwrap();

    // HEAD resolves through refs/heads/master to the commit.
    assert_eq!(
        refs::resolve_name(&repo, &store, "HEAD").unwrap(),
        commit_sha
    );

    // Peeling HEAD to a tree lands on the root tree.
    assert_eq!(
        refs::resolve_typed(&repo, &store, "HEAD", Some(ObjectKind::Tree), true).unwrap(),
        Some(root.clone())
    );

    // A unique hash prefix resolves to the commit.
    assert_eq!(
        refs::resolve_name(&repo, &store, &commit_sha[..10]).unwrap(),
        commit_sha
    );

    let out = dir.path().join("export");
    checkout(&store, &root, &out).unwrap();
    assert_eq!(std::fs::read(out.join("a.txt")).unwrap(), b"alpha\n");
    assert_eq!(std::fs::read(out.join("docs/guide.md")).unwrap(), b"# guide\n");
}

#[test]
fn annotated_tag_peels_to_its_target() {
    let dir = tempdir().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let store = ObjectStore::open(&repo);

    std::fs::write(repo.worktree().join("f"), b"data\n").unwrap();
    let mut index = Index::default();
    index::stage_file(&repo, &store, &mut index, "f").unwrap();
    let root = index::build_tree(&store, &index).unwrap();
    let commit_sha = store.write(&commit_object(&root, None, "tagged")).unwrap();

    let mut tag_body = Kvlm::new();
    tag_body.push(b"object".to_vec(), commit_sha.as_bytes().to_vec());
    tag_body.push(b"type".to_vec(), b"commit".to_vec());
    tag_body.push(b"tag".to_vec(), b"v1".to_vec());
    tag_body.push(
        b"tagger".to_vec(),
        b"Test <test@example.com> 1700000000 +0000".to_vec(),
    );
    tag_body.set_message(b"release\n".to_vec());
    let tag_sha = store.write(&Object::Tag(tag_body)).unwrap();
    refs::write_ref(&repo, "refs/tags/v1", &tag_sha).unwrap();

    // Unpeeled resolution lands on the tag object itself.
    assert_eq!(refs::resolve_name(&repo, &store, "v1").unwrap(), tag_sha);

    // One peel step reaches the commit, two reach the tree.
    assert_eq!(
        refs::resolve_typed(&repo, &store, "v1", Some(ObjectKind::Commit), true).unwrap(),
        Some(commit_sha)
    );
    assert_eq!(
        refs::resolve_typed(&repo, &store, "v1", Some(ObjectKind::Tree), true).unwrap(),
        Some(root.clone())
    );

    // With follow disabled a type mismatch is a clean no-match.
    assert_eq!(
        refs::resolve_typed(&repo, &store, "v1", Some(ObjectKind::Commit), false).unwrap(),
        None
    );

    let flat = tree::flatten(&store, &root).unwrap();
    assert_eq!(flat.len(), 1);
}

#[test]
fn second_commit_lists_its_parent() {
    let dir = tempdir().unwrap();
    let repo = Repository::create(dir.path()).unwrap();
    let store = ObjectStore::open(&repo);

    std::fs::write(repo.worktree().join("f"), b"one\n").unwrap();
    let mut index = Index::default();
    index::stage_file(&repo, &store, &mut index, "f").unwrap();
    let root1 = index::build_tree(&store, &index).unwrap();
    let first = store.write(&commit_object(&root1, None, "one")).unwrap();
    refs::update_head(&repo, &first).unwrap();

    std::fs::write(repo.worktree().join("f"), b"two\n").unwrap();
    index::stage_file(&repo, &store, &mut index, "f").unwrap();
    let root2 = index::build_tree(&store, &index).unwrap();
    let second = store
        .write(&commit_object(&root2, Some(&first), "two"))
        .unwrap();
    refs::update_head(&repo, &second).unwrap();

    let head = refs::resolve_name(&repo, &store, "HEAD").unwrap();
    assert_eq!(head, second);

    match store.read(&head).unwrap() {
        Object::Commit(body) => {
            let parents = body.get(b"parent").unwrap();
            assert_eq!(parents, &[first.as_bytes().to_vec()]);
        }
        other => panic!("expected a commit, got {}", other.kind()),
    }

    // The repository handle can be rebuilt from any nested path.
    let nested = repo.worktree().join("sub/dir");
    std::fs::create_dir_all(&nested).unwrap();
    let rediscovered = Repository::discover(&nested).unwrap();
    assert_eq!(
        refs::resolve_name(&rediscovered, &ObjectStore::open(&rediscovered), "HEAD").unwrap(),
        second
    );
}
