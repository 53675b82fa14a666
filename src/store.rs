//! Object store: read/write objects at the fanout path under `<git_dir>/objects`.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::object::{self, Id, Kind};

pub struct ObjectStore {
    git_dir: PathBuf,
}

impl ObjectStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.git_dir.join("objects")
    }

    pub fn path_for(&self, id: &Id) -> PathBuf {
        let (dir, rest) = id.fanout_path();
        self.objects_dir().join(dir).join(rest)
    }

    pub fn exists(&self, id: &Id) -> bool {
        self.path_for(id).is_file()
    }

    /// Writes `(kind, payload)`, returning its id. A no-op if the id is already present.
    pub fn put(&self, kind: Kind, payload: &[u8]) -> anyhow::Result<Id> {
        let (id, stored) = object::encode(kind, payload)?;
        if self.exists(&id) {
            return Ok(id);
        }

        let path = self.path_for(&id);
        let parent = path
            .parent()
            .context("object path unexpectedly has no parent")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("creating object directory {}", parent.display()))?;
        fs::write(&path, stored).with_context(|| format!("writing object {}", path.display()))?;

        Ok(id)
    }

    pub fn get(&self, id: &Id) -> anyhow::Result<(Kind, Vec<u8>)> {
        let path = self.path_for(id);
        let stored = fs::read(&path)
            .with_context(|| format!("object {id} not found in store (looked at {})", path.display()))?;
        object::decode(&stored).with_context(|| format!("decoding object {id}"))
    }

    pub fn get_kind(&self, id: &Id) -> anyhow::Result<Kind> {
        Ok(self.get(id)?.0)
    }
}
