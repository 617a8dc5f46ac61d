// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk resource store.
//
// Layout under the store root:
//
//   {kind-dir}/{shard}/{id}.json       resource records
//   etextcontents/{shard}/{id}.txt     etext lines
//
// `shard` is the first two hex digits of the SHA-256 of the id up to its
// first underscore, so an item and all of its etexts share a shard.

use std::path::{Path, PathBuf};

use pecha_core::error::{PechaError, Result};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use crate::accessor::ResourceAccessor;
use crate::kind::{ResourceKind, local_id};
use crate::resource::Resource;

const TEXT_DIR: &str = "etextcontents";

/// Resource accessor backed by a sharded directory tree.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `id`, or `None` if its kind is unknown.
    pub fn resource_path(&self, id: &str) -> Option<PathBuf> {
        let id = local_id(id);
        let kind = ResourceKind::from_id(id)?;
        Some(
            self.root
                .join(kind.dir_name())
                .join(shard(id))
                .join(format!("{id}.json")),
        )
    }

    /// Path of the text file for etext `id`.
    pub fn text_path(&self, id: &str) -> PathBuf {
        let id = local_id(id);
        self.root
            .join(TEXT_DIR)
            .join(shard(id))
            .join(format!("{id}.txt"))
    }

    /// Write `resource` to its place in the tree.
    pub fn put_resource(&self, resource: &Resource) -> Result<PathBuf> {
        let path = self.resource_path(&resource.id).ok_or_else(|| {
            PechaError::UnsupportedResource {
                id: resource.id.clone(),
                reason: "identifier has no known kind prefix".into(),
            }
        })?;
        write_creating_parents(&path, serde_json::to_string_pretty(resource)?.as_bytes())?;
        Ok(path)
    }

    /// Write the text of etext `id`.
    pub fn put_text(&self, id: &str, text: &str) -> Result<PathBuf> {
        let path = self.text_path(id);
        write_creating_parents(&path, text.as_bytes())?;
        Ok(path)
    }

    /// Ids of every stored record of `kind`, sorted.
    pub fn list_ids(&self, kind: ResourceKind) -> Result<Vec<String>> {
        let kind_dir = self.root.join(kind.dir_name());
        if !kind_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for shard in std::fs::read_dir(&kind_dir)? {
            let shard = shard?.path();
            let hidden = shard
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if !shard.is_dir() || hidden {
                continue;
            }
            for entry in std::fs::read_dir(&shard)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ResourceAccessor for FileStore {
    #[instrument(skip(self))]
    fn load_resource(&self, id: &str) -> Result<Option<Resource>> {
        let Some(path) = self.resource_path(id) else {
            warn!(id, "identifier has no known kind prefix");
            return Ok(None);
        };
        if !path.exists() {
            debug!(path = %path.display(), "resource file not found");
            return Ok(None);
        }

        let data = std::fs::read_to_string(&path)?;
        let mut resource: Resource = serde_json::from_str(&data)?;
        if resource.id.is_empty() {
            resource.id = local_id(id).to_string();
        }
        Ok(Some(resource))
    }

    #[instrument(skip(self))]
    fn load_lines(&self, id: &str) -> Result<Option<Vec<String>>> {
        let path = self.text_path(id);
        if !path.exists() {
            warn!(path = %path.display(), "etext content not found");
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path)?;
        Ok(Some(text.lines().map(str::to_string).collect()))
    }
}

/// Two-hex-digit shard of `id`.
fn shard(id: &str) -> String {
    let base = id.split('_').next().unwrap_or(id);
    let digest = Sha256::digest(base.as_bytes());
    hex::encode(&digest[..1])
}

fn write_creating_parents(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etexts_share_their_item_shard() {
        assert_eq!(shard("UT1KG9127_I1KG9127_0001"), shard("UT1KG9127"));
        assert_eq!(shard("W22084").len(), 2);
    }

    #[test]
    fn resource_round_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());

        let work = Resource::new("W22084")
            .with_kind("Work")
            .with_text_in("prefLabel", "རྒྱུད", "bo");
        let path = store.put_resource(&work).expect("put");
        assert!(path.starts_with(dir.path().join("works")));

        let loaded = store.load_resource("W22084").expect("load").expect("found");
        assert_eq!(loaded, work);
    }

    #[test]
    fn missing_resource_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        assert!(store.load_resource("W404").expect("load").is_none());
        assert!(store.load_resource("XY1").expect("load").is_none());
    }

    #[test]
    fn text_lines_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        store.put_text("UT1_0001", "བཀྲ་ཤིས\nབདེ་ལེགས\n").expect("put");

        let lines = store.load_lines("UT1_0001").expect("load").expect("found");
        assert_eq!(lines, vec!["བཀྲ་ཤིས", "བདེ་ལེགས"]);
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        let path = store.resource_path("W1").expect("path");
        write_creating_parents(&path, b"{ not json").expect("write");

        assert!(matches!(
            store.load_resource("W1"),
            Err(PechaError::Serialization(_))
        ));
    }

    #[test]
    fn list_ids_walks_shards() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        store.put_resource(&Resource::new("I2")).expect("put");
        store.put_resource(&Resource::new("I1")).expect("put");
        store.put_resource(&Resource::new("W1")).expect("put");

        assert_eq!(store.list_ids(ResourceKind::Item).expect("list"), vec!["I1", "I2"]);
        assert!(store.list_ids(ResourceKind::Etext).expect("list").is_empty());
    }
}
