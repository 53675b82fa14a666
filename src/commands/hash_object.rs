use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::object::{self, Id, Kind};
use crate::repo;
use crate::store::ObjectStore;

/// `hash-object [-w] [-t <type>] <file>` command. Prints the id and returns it.
pub fn invoke(path: &Path, write: bool, kind: Kind) -> anyhow::Result<Id> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let id = if write {
        let store = ObjectStore::new(repo::git_dir(Path::new(".")));
        store.put(kind, &data)?
    } else {
        object::hash(kind, &data)
    };

    println!("{id}");
    Ok(id)
}
