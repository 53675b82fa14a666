use std::path::{Path, PathBuf};

use crate::checkout;
use crate::commit;
use crate::object::Id;
use crate::pack;
use crate::protocol::smart;
use crate::repo;
use crate::store::ObjectStore;

/// `clone <url> [<dir>]` command: the C10 orchestrator.
///
/// Discovers refs via `ls-refs`, fetches a packfile covering HEAD's target, unpacks it into a
/// fresh `.git/`, writes every advertised branch ref plus a symbolic HEAD, and checks out the
/// working tree.
pub fn invoke(url: &str, dir: Option<&Path>) -> anyhow::Result<()> {
    let dest = match dir {
        Some(dir) => dir.to_path_buf(),
        None => derive_dir_from_url(url)?,
    };

    let git_dir = repo::init_layout(&dest)?;
    let store = ObjectStore::new(git_dir.clone());

    let client = reqwest::blocking::Client::new();
    let refs = smart::ls_refs(&client, url)?;
    anyhow::ensure!(!refs.is_empty(), "remote {url} advertised no refs");

    let head_target = refs
        .iter()
        .find(|(name, _)| name == "HEAD")
        .or_else(|| refs.iter().find(|(name, _)| name == "refs/heads/main"))
        .or_else(|| refs.iter().find(|(name, _)| name == "refs/heads/master"))
        .or_else(|| refs.iter().find(|(name, _)| name.starts_with("refs/heads/")))
        .map(|(name, id)| (name.clone(), *id))
        .ok_or_else(|| anyhow::anyhow!("remote {url} advertised no usable branch"))?;

    let mut wants: Vec<Id> = refs
        .iter()
        .filter(|(name, _)| name.starts_with("refs/heads/") || name.starts_with("refs/tags/"))
        .map(|(_, id)| *id)
        .collect();
    // HEAD may advertise a commit that isn't also named under refs/heads/* or refs/tags/*
    // (detached-HEAD-style advertisement); it must still always be fetched.
    if !wants.contains(&head_target.1) {
        wants.push(head_target.1);
    }

    let pack_bytes = smart::fetch(&client, url, &wants)?;
    pack::unpack(&store, &pack_bytes)?;

    for (name, id) in &refs {
        if name.starts_with("refs/heads/") {
            repo::write_ref(&git_dir, name, id)?;
        }
    }

    let head_branch = if head_target.0 == "HEAD" {
        "refs/heads/main".to_string()
    } else {
        head_target.0.clone()
    };
    repo::set_head_symbolic(&git_dir, &head_branch)?;
    if !git_dir.join(&head_branch).exists() {
        repo::write_ref(&git_dir, &head_branch, &head_target.1)?;
    }

    let (_, commit_payload) = store.get(&head_target.1)?;
    let tree_id = commit::tree_of(&commit_payload)?;
    checkout::checkout(&store, &tree_id, &dest)?;

    println!("Cloned into '{}'", dest.display());
    Ok(())
}

fn derive_dir_from_url(url: &str) -> anyhow::Result<PathBuf> {
    let trimmed = url.trim_end_matches('/');
    let basename = trimmed
        .rsplit('/')
        .next()
        .ok_or_else(|| anyhow::anyhow!("cannot derive a directory name from url {url}"))?;
    let basename = basename.strip_suffix(".git").unwrap_or(basename);
    anyhow::ensure!(!basename.is_empty(), "cannot derive a directory name from url {url}");
    Ok(PathBuf::from(basename))
}
