//! Working-tree writer: materialize a tree object to a directory.

use std::fs;
use std::path::{Component, Path};

use anyhow::Context;

use crate::error::CheckoutError;
use crate::object::{Id, Kind};
use crate::store::ObjectStore;
use crate::tree::{self, Mode};

fn validate_name(name: &[u8]) -> anyhow::Result<&str> {
    let name = std::str::from_utf8(name).context("tree entry name is not utf8")?;
    let path = Path::new(name);
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
    {
        return Err(CheckoutError(path.to_path_buf()).into());
    }
    Ok(name)
}

/// Recursively writes the tree at `tree_id` into `dest`, creating `dest` if needed.
pub fn checkout(store: &ObjectStore, tree_id: &Id, dest: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("creating directory {}", dest.display()))?;

    let (kind, payload) = store.get(tree_id)?;
    anyhow::ensure!(kind == Kind::Tree, "checkout target {tree_id} is not a tree");
    let entries = tree::parse(&payload)?;

    for entry in entries {
        let name = validate_name(&entry.name)?;
        let path = dest.join(name);

        match entry.mode {
            Mode::Directory => checkout(store, &entry.id, &path)?,
            Mode::Regular | Mode::Executable => {
                let (kind, data) = store.get(&entry.id)?;
                anyhow::ensure!(kind == Kind::Blob, "tree entry {name} does not point at a blob");
                fs::write(&path, &data)
                    .with_context(|| format!("writing file {}", path.display()))?;
                set_executable(&path, entry.mode == Mode::Executable)?;
            }
            Mode::Symlink => {
                let (kind, data) = store.get(&entry.id)?;
                anyhow::ensure!(kind == Kind::Blob, "tree entry {name} does not point at a blob");
                let target = std::str::from_utf8(&data).context("symlink target is not utf8")?;
                write_symlink(target, &path)?;
            }
        }
    }

    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path, executable: bool) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if !executable {
        return Ok(());
    }
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)
        .with_context(|| format!("setting executable bit on {}", path.display()))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path, _executable: bool) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &str, path: &Path) -> anyhow::Result<()> {
    if path.exists() || path.symlink_metadata().is_ok() {
        let _ = fs::remove_file(path);
    }
    std::os::unix::fs::symlink(target, path)
        .with_context(|| format!("creating symlink {}", path.display()))
}

#[cfg(not(unix))]
fn write_symlink(target: &str, path: &Path) -> anyhow::Result<()> {
    fs::write(path, target).with_context(|| format!("writing symlink target to {}", path.display()))
}
