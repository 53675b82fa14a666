//! Repository layout: `.git/` skeleton creation and ref file handling.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::object::Id;

pub fn git_dir(root: &Path) -> PathBuf {
    root.join(".git")
}

/// Creates the `.git/` skeleton and writes `HEAD -> refs/heads/main`.
pub fn init_layout(root: &Path) -> anyhow::Result<PathBuf> {
    let git_dir = git_dir(root);
    fs::create_dir_all(git_dir.join("objects"))
        .with_context(|| format!("creating {}", git_dir.join("objects").display()))?;
    fs::create_dir_all(git_dir.join("refs/heads"))
        .with_context(|| format!("creating {}", git_dir.join("refs/heads").display()))?;
    set_head_symbolic(&git_dir, "refs/heads/main")?;
    Ok(git_dir)
}

pub fn set_head_symbolic(git_dir: &Path, refname: &str) -> anyhow::Result<()> {
    fs::write(git_dir.join("HEAD"), format!("ref: {refname}\n"))
        .with_context(|| format!("writing {}", git_dir.join("HEAD").display()))
}

pub fn write_ref(git_dir: &Path, refname: &str, id: &Id) -> anyhow::Result<()> {
    let path = git_dir.join(refname);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, format!("{id}\n")).with_context(|| format!("writing ref {}", path.display()))
}

/// Resolves a ref (following one level of `HEAD`'s `ref: <name>` indirection) to an id.
pub fn read_ref(git_dir: &Path, refname: &str) -> anyhow::Result<Id> {
    let path = git_dir.join(refname);
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading ref {}", path.display()))?;
    let contents = contents.trim();

    if let Some(target) = contents.strip_prefix("ref: ") {
        return read_ref(git_dir, target.trim());
    }

    contents
        .parse()
        .with_context(|| format!("parsing ref contents '{contents}' in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{self, Kind};

    #[test]
    fn init_layout_creates_expected_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = init_layout(dir.path()).unwrap();

        assert!(git_dir.join("objects").is_dir());
        assert!(git_dir.join("refs/heads").is_dir());
        let head = fs::read_to_string(git_dir.join("HEAD")).unwrap();
        assert_eq!(head, "ref: refs/heads/main\n");
    }

    #[test]
    fn write_ref_then_read_ref_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let git_dir = init_layout(dir.path()).unwrap();
        let id = object::hash(Kind::Blob, b"hello\n");

        write_ref(&git_dir, "refs/heads/main", &id).unwrap();
        set_head_symbolic(&git_dir, "refs/heads/main").unwrap();

        assert_eq!(read_ref(&git_dir, "HEAD").unwrap(), id);
        assert_eq!(read_ref(&git_dir, "refs/heads/main").unwrap(), id);
    }
}
