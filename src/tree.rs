//! Tree codec: entry (mode, name, id) binary format with its sort-order invariant.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};

use crate::object::{Id, Kind};
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Regular,
    Executable,
    Symlink,
    Directory,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Regular => "100644",
            Mode::Executable => "100755",
            Mode::Symlink => "120000",
            Mode::Directory => "40000",
        }
    }

    pub fn is_dir(self) -> bool {
        matches!(self, Mode::Directory)
    }

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "100644" => Ok(Mode::Regular),
            "100755" => Ok(Mode::Executable),
            "120000" => Ok(Mode::Symlink),
            "40000" => Ok(Mode::Directory),
            other => bail!("corrupt tree: unrecognized mode '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub mode: Mode,
    pub name: Vec<u8>,
    pub id: Id,
}

/// Sort key: directory names compare as if suffixed with `/`.
fn sort_key(entry: &Entry) -> Vec<u8> {
    let mut key = entry.name.clone();
    if entry.mode.is_dir() {
        key.push(b'/');
    }
    key
}

/// Serializes tree entries into the canonical payload, sorted per the directory-slash rule.
pub fn serialize(entries: &[Entry]) -> anyhow::Result<Vec<u8>> {
    for entry in entries {
        anyhow::ensure!(!entry.name.is_empty(), "tree entry name must not be empty");
        anyhow::ensure!(
            !entry.name.contains(&b'/') && !entry.name.contains(&0),
            "tree entry name must not contain '/' or NUL"
        );
    }

    let mut sorted: Vec<&Entry> = entries.iter().collect();
    sorted.sort_by_key(|e| sort_key(e));

    let mut payload = Vec::new();
    for entry in sorted {
        payload.extend_from_slice(entry.mode.as_str().as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(&entry.name);
        payload.push(0);
        payload.extend_from_slice(entry.id.as_bytes());
    }
    Ok(payload)
}

/// Parses a tree payload into its (sort-normalized) entries.
pub fn parse(payload: &[u8]) -> anyhow::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < payload.len() {
        let space = payload[pos..]
            .iter()
            .position(|&b| b == b' ')
            .context("corrupt tree: missing space after mode")?
            + pos;
        let mode_str =
            std::str::from_utf8(&payload[pos..space]).context("corrupt tree: mode not utf8")?;
        let mode = Mode::from_str(mode_str)?;

        let nul = payload[space + 1..]
            .iter()
            .position(|&b| b == 0)
            .context("corrupt tree: missing NUL after name")?
            + space
            + 1;
        let name = payload[space + 1..nul].to_vec();

        let id_start = nul + 1;
        let id_end = id_start + 20;
        anyhow::ensure!(
            id_end <= payload.len(),
            "corrupt tree: truncated 20-byte id at end of entry"
        );
        let id = Id::from_slice(&payload[id_start..id_end])?;

        entries.push(Entry { mode, name, id });
        pos = id_end;
    }

    Ok(entries)
}

/// Recursively snapshots `dir` (ignoring `.git` and `target`) into tree objects.
///
/// Returns `None` for an empty directory — callers typically treat a `None` root as an error.
pub fn write_tree(store: &ObjectStore, dir: &Path) -> anyhow::Result<Option<Id>> {
    let mut entries = Vec::new();

    for dirent in fs::read_dir(dir).with_context(|| format!("opening directory {}", dir.display()))? {
        let dirent = dirent.with_context(|| format!("bad directory entry in {}", dir.display()))?;
        let file_name = dirent.file_name();

        if file_name == ".git" || file_name == "target" {
            continue;
        }

        let metadata = dirent
            .metadata()
            .with_context(|| format!("reading metadata for {}", dirent.path().display()))?;

        let (mode, id) = if metadata.is_dir() {
            match write_tree(store, &dirent.path())? {
                Some(id) => (Mode::Directory, id),
                None => continue,
            }
        } else if metadata.is_symlink() {
            let target = fs::read_link(dirent.path())
                .with_context(|| format!("reading symlink {}", dirent.path().display()))?;
            let id = store.put(Kind::Blob, target.to_string_lossy().as_bytes())?;
            (Mode::Symlink, id)
        } else {
            let data = fs::read(dirent.path())
                .with_context(|| format!("reading file {}", dirent.path().display()))?;
            let id = store.put(Kind::Blob, &data)?;
            (mode_for_file(&metadata), id)
        };

        entries.push(Entry {
            mode,
            name: file_name.as_encoded_bytes().to_vec(),
            id,
        });
    }

    if entries.is_empty() {
        return Ok(None);
    }

    let payload = serialize(&entries)?;
    Ok(Some(store.put(Kind::Tree, &payload)?))
}

#[cfg(unix)]
fn mode_for_file(metadata: &fs::Metadata) -> Mode {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        Mode::Executable
    } else {
        Mode::Regular
    }
}

#[cfg(not(unix))]
fn mode_for_file(_metadata: &fs::Metadata) -> Mode {
    Mode::Regular
}
