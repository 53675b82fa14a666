//! Commit builder: header lines, blank line, message.

use crate::object::{Id, Kind};
use crate::store::ObjectStore;

#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Signed timezone offset from UTC, in minutes (e.g. `-300` for `-0500`).
#[derive(Debug, Clone, Copy)]
pub struct TzOffset(pub i32);

impl TzOffset {
    pub const UTC: TzOffset = TzOffset(0);

    fn format(self) -> String {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let minutes = self.0.unsigned_abs();
        format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
    }
}

/// Builds the canonical commit payload (does not write it to the store).
#[allow(clippy::too_many_arguments)]
pub fn build_payload(
    tree: &Id,
    parents: &[Id],
    author: &Identity,
    author_ts: (i64, TzOffset),
    committer: &Identity,
    committer_ts: (i64, TzOffset),
    message: &str,
) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("tree {tree}\n"));
    for parent in parents {
        out.push_str(&format!("parent {parent}\n"));
    }
    out.push_str(&format!(
        "author {} <{}> {} {}\n",
        author.name,
        author.email,
        author_ts.0,
        author_ts.1.format()
    ));
    out.push_str(&format!(
        "committer {} <{}> {} {}\n",
        committer.name,
        committer.email,
        committer_ts.0,
        committer_ts.1.format()
    ));
    out.push('\n');
    out.push_str(message);

    out.into_bytes()
}

#[allow(clippy::too_many_arguments)]
pub fn create(
    store: &ObjectStore,
    tree: &Id,
    parents: &[Id],
    author: &Identity,
    author_ts: (i64, TzOffset),
    committer: &Identity,
    committer_ts: (i64, TzOffset),
    message: &str,
) -> anyhow::Result<Id> {
    let payload = build_payload(tree, parents, author, author_ts, committer, committer_ts, message);
    store.put(Kind::Commit, &payload)
}

/// Scans a commit payload for the first `tree <hex40>` header line.
pub fn tree_of(payload: &[u8]) -> anyhow::Result<Id> {
    use anyhow::Context;
    let text = std::str::from_utf8(payload).context("commit payload is not utf8")?;
    for line in text.lines() {
        if let Some(hex) = line.strip_prefix("tree ") {
            return hex.trim().parse();
        }
        if line.is_empty() {
            break;
        }
    }
    anyhow::bail!("commit has no 'tree' header line")
}
