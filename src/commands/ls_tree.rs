use std::path::{Path, PathBuf};

use crate::object::{Id, Kind};
use crate::repo;
use crate::store::ObjectStore;
use crate::tree;

/// `ls-tree [--name-only] [--recurse] <tree>` command.
pub fn invoke(id: &Id, name_only: bool, recurse: bool) -> anyhow::Result<()> {
    let store = ObjectStore::new(repo::git_dir(Path::new(".")));
    list(&store, id, name_only, recurse, None)
}

fn list(
    store: &ObjectStore,
    id: &Id,
    name_only: bool,
    recurse: bool,
    prefix: Option<&Path>,
) -> anyhow::Result<()> {
    let (kind, payload) = store.get(id)?;
    anyhow::ensure!(kind == Kind::Tree, "object {id} is not a tree");

    for entry in tree::parse(&payload)? {
        let name = String::from_utf8_lossy(&entry.name).into_owned();
        let display_path = match prefix {
            Some(p) => p.join(&name),
            None => PathBuf::from(&name),
        };

        if recurse && entry.mode.is_dir() {
            list(store, &entry.id, name_only, recurse, Some(&display_path))?;
            continue;
        }

        if name_only {
            println!("{}", display_path.display());
        } else {
            let entry_kind = if entry.mode.is_dir() { Kind::Tree } else { Kind::Blob };
            println!(
                "{} {} {}\t{}",
                entry.mode.as_str(),
                entry_kind,
                entry.id,
                display_path.display()
            );
        }
    }

    Ok(())
}
