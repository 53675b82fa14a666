use std::io::Write;

use crate::object::Id;
use crate::repo;
use crate::store::ObjectStore;

/// `cat-file -p|-t|-s <object>` command.
pub fn invoke(id: &Id, type_only: bool, size_only: bool, pretty_print: bool) -> anyhow::Result<()> {
    let store = ObjectStore::new(repo::git_dir(std::path::Path::new(".")));
    let (kind, payload) = store.get(id)?;

    if type_only {
        println!("{kind}");
        return Ok(());
    }

    if size_only {
        println!("{}", payload.len());
        return Ok(());
    }

    anyhow::ensure!(pretty_print, "one of -p, -t, -s is required");
    std::io::stdout().write_all(&payload)?;
    Ok(())
}
