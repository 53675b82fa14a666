use std::path::Path;

use crate::repo;

/// `init` command: create the `.git/` skeleton.
pub fn invoke(dir: &Path) -> anyhow::Result<()> {
    repo::init_layout(dir)?;
    println!("Initialized git directory");
    Ok(())
}
