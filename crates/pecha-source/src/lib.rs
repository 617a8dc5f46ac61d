// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pecha-source: Resource accessor for the Pecha pipeline.
//
// Resolves bibliographic identifiers to resource records and loads the raw
// lines of digitized volumes. Records are read through the `ResourceAccessor`
// trait; `FileStore` serves a sharded JSON tree on disk and `MemoryStore`
// serves records held in memory. `Loader` turns records into the typed
// `BibResource` variant the document builder consumes.

pub mod accessor;
pub mod file_store;
pub mod kind;
pub mod language;
pub mod model;
pub mod resource;
pub mod vocab;

pub use accessor::{MemoryStore, ResourceAccessor};
pub use file_store::FileStore;
pub use kind::{ResourceKind, local_id};
pub use language::LanguageRule;
pub use model::{BibResource, Etext, Item, Loader, Pagination, Volume};
pub use resource::{Link, Literal, LiteralValue, Reference, Resource, Value};
