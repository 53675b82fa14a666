use std::env;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::commit::{self, Identity, TzOffset};
use crate::object::Id;
use crate::repo;
use crate::store::ObjectStore;

/// `commit-tree <tree> [-p <parent>]... -m <message>` command.
pub fn invoke(tree: &Id, parents: &[Id], message: &str) -> anyhow::Result<()> {
    let store = ObjectStore::new(repo::git_dir(Path::new(".")));

    let author = identity_from_env("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL");
    let committer = identity_from_env("GIT_COMMITTER_NAME", "GIT_COMMITTER_EMAIL");
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    let id = commit::create(
        &store,
        tree,
        parents,
        &author,
        (now, TzOffset::UTC),
        &committer,
        (now, TzOffset::UTC),
        message,
    )?;

    println!("{id}");
    Ok(())
}

fn identity_from_env(name_var: &str, email_var: &str) -> Identity {
    Identity {
        name: env::var(name_var).unwrap_or_else(|_| "minigit".to_string()),
        email: env::var(email_var).unwrap_or_else(|_| "minigit@localhost".to_string()),
    }
}
