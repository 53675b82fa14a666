use std::path::Path;

use crate::repo;
use crate::store::ObjectStore;
use crate::tree;

/// `write-tree` command: recursively snapshot the current directory.
pub fn invoke() -> anyhow::Result<()> {
    let store = ObjectStore::new(repo::git_dir(Path::new(".")));
    let Some(id) = tree::write_tree(&store, Path::new("."))? else {
        anyhow::bail!("cannot write-tree an empty directory");
    };
    println!("{id}");
    Ok(())
}
