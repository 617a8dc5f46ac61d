// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The resource accessor contract and an in-memory implementation.

use std::collections::HashMap;

use pecha_core::error::Result;

use crate::kind::local_id;
use crate::resource::Resource;

/// Resolves identifiers to resource records and loads etext lines.
///
/// Implementations must be shareable across worker threads. "Not found" is
/// `Ok(None)`; `Err` is reserved for stores that exist but cannot be read.
pub trait ResourceAccessor: Send + Sync {
    /// Load the record for `id` (a bare identifier or a full IRI).
    fn load_resource(&self, id: &str) -> Result<Option<Resource>>;

    /// Load the logical lines of an etext, without line terminators.
    fn load_lines(&self, id: &str) -> Result<Option<Vec<String>>>;
}

/// Accessor over records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    resources: HashMap<String, Resource>,
    texts: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `resource` under its own id.
    pub fn insert_resource(&mut self, resource: Resource) {
        self.resources.insert(resource.id.clone(), resource);
    }

    /// Store the text of `id`, split into logical lines.
    pub fn insert_text(&mut self, id: impl Into<String>, text: &str) {
        self.texts
            .insert(id.into(), text.lines().map(str::to_string).collect());
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.insert_resource(resource);
        self
    }

    pub fn with_text(mut self, id: impl Into<String>, text: &str) -> Self {
        self.insert_text(id, text);
        self
    }
}

impl ResourceAccessor for MemoryStore {
    fn load_resource(&self, id: &str) -> Result<Option<Resource>> {
        Ok(self.resources.get(local_id(id)).cloned())
    }

    fn load_lines(&self, id: &str) -> Result<Option<Vec<String>>> {
        Ok(self.texts.get(local_id(id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_bare_ids_and_iris() {
        let store = MemoryStore::new().with_resource(Resource::new("W1").with_kind("Work"));
        assert!(store.load_resource("W1").expect("load").is_some());
        assert!(
            store
                .load_resource("http://purl.bdrc.io/resource/W1")
                .expect("load")
                .is_some()
        );
    }

    #[test]
    fn missing_records_are_none() {
        let store = MemoryStore::new();
        assert!(store.load_resource("W404").expect("load").is_none());
        assert!(store.load_lines("UT404").expect("load").is_none());
    }

    #[test]
    fn text_is_split_into_lines() {
        let store = MemoryStore::new().with_text("UT1", "Hello\nWorld");
        assert_eq!(
            store.load_lines("UT1").expect("load"),
            Some(vec!["Hello".to_string(), "World".to_string()])
        );
    }
}
