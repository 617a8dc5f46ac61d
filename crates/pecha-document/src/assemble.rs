// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly: one resource id → the documents it yields.
//
// Items produce one document per volume, each structured by the item's work.
// A standalone etext produces a single document of its page-annotated text.
// Per-volume failures are collected so the rest of the item still renders.

use pecha_core::error::{PechaError, Result};
use pecha_core::tibetan::tibetan_number;
use pecha_core::{Document, PechaConfig};
use pecha_source::{BibResource, Etext, Item, Loader, ResourceAccessor, Volume};
use tracing::{debug, info, instrument, warn};

use crate::markdown::{MarkdownOptions, write_sections};
use crate::naming::{NameParts, document_name};
use crate::pages::{map_pages, plain_text};
use crate::sections::{SectionForest, build_sections};

/// A volume that could not be rendered.
#[derive(Debug)]
pub struct VolumeFailure {
    pub volume: u32,
    pub etext_id: String,
    pub error: PechaError,
}

/// Everything produced for one resource id.
#[derive(Debug, Default)]
pub struct Assembly {
    pub documents: Vec<Document>,
    pub failures: Vec<VolumeFailure>,
}

/// Builds documents from resources read through an accessor.
pub struct DocumentAssembler<'a> {
    accessor: &'a dyn ResourceAccessor,
    config: &'a PechaConfig,
    options: MarkdownOptions,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(accessor: &'a dyn ResourceAccessor, config: &'a PechaConfig) -> Self {
        Self {
            accessor,
            config,
            options: MarkdownOptions::from_config(config),
        }
    }

    /// Load `id` and build its documents.
    ///
    /// Errors only when the resource itself cannot be used; a failing volume
    /// of an item is reported in [`Assembly::failures`].
    #[instrument(skip(self))]
    pub fn assemble(&self, id: &str) -> Result<Assembly> {
        let mut loader = Loader::new(self.accessor, self.config);
        match loader.load(id)? {
            BibResource::Item(item) => Ok(self.item_documents(&mut loader, &item)),
            BibResource::Etext(etext) => {
                let document = self.etext_document(&mut loader, &etext)?;
                Ok(Assembly {
                    documents: vec![document],
                    failures: Vec::new(),
                })
            }
            BibResource::Work(work) => Err(PechaError::UnsupportedResource {
                id: work.id,
                reason: "works are rendered through their items".into(),
            }),
        }
    }

    /// One document per volume of `item`.
    pub fn item_documents(&self, loader: &mut Loader<'_>, item: &Item) -> Assembly {
        let mut assembly = Assembly::default();
        if item.volumes.is_empty() {
            warn!(item = %item.id, "item has no volumes with etexts");
        }

        for volume in &item.volumes {
            match self.volume_document(loader, item, volume) {
                Ok(document) => assembly.documents.push(document),
                Err(error) => {
                    warn!(
                        item = %item.id,
                        volume = volume.number,
                        etext = %volume.etext_id,
                        error = %error,
                        "skipping volume"
                    );
                    assembly.failures.push(VolumeFailure {
                        volume: volume.number,
                        etext_id: volume.etext_id.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            item = %item.id,
            documents = assembly.documents.len(),
            failed = assembly.failures.len(),
            "item assembled"
        );
        assembly
    }

    /// The document for one volume of `item`.
    #[instrument(skip(self, loader, item), fields(item = %item.id, volume = volume.number))]
    pub fn volume_document(
        &self,
        loader: &mut Loader<'_>,
        item: &Item,
        volume: &Volume,
    ) -> Result<Document> {
        let etext = loader.load_etext(&volume.etext_id)?;
        let lines = loader.load_lines(&volume.etext_id)?;
        let full_text = plain_text(&lines);

        let forest = match (&item.work, etext.pagination.table()) {
            (Some(work), Some(table)) => {
                let mapped = map_pages(&lines, table);
                build_sections(
                    work,
                    volume.number,
                    &mapped.pages,
                    &full_text,
                    &self.config.fallback_title,
                )
            }
            (work, _) => {
                debug!(
                    has_work = work.is_some(),
                    pagination = ?etext.pagination,
                    "volume rendered as a single section"
                );
                SectionForest::fallback(&self.config.fallback_title, full_text)
            }
        };

        let title = item
            .title()
            .or(etext.title.as_deref())
            .unwrap_or(&item.id)
            .to_string();
        let total_volumes = item.total_volumes();
        let ocr = item.is_ocr(self.config);

        let mut body = format!("# {title}\n\n");
        if total_volumes > 1 {
            body.push_str(&format!(
                "#### {} {} {{.volume}}\n\n",
                self.config.volume_label,
                tibetan_number(volume.number)
            ));
        }
        if let Some(terms) = &self.config.terms_markdown {
            body.push_str(terms.trim_end());
            body.push_str("\n\n");
        }
        body.push_str(&write_sections(&forest, &self.options));

        Ok(Document {
            name: document_name(
                NameParts {
                    id: &item.id,
                    title: &title,
                    volume: volume.number,
                    total_volumes,
                    ocr,
                },
                self.config,
            ),
            title,
            volume: volume.number,
            total_volumes,
            author: item.author().map(str::to_string),
            inputter: item.inputter(self.config).map(str::to_string),
            ocr,
            body,
        })
    }

    /// The document for a standalone etext: its page-annotated text.
    #[instrument(skip(self, loader, etext), fields(etext = %etext.id))]
    pub fn etext_document(&self, loader: &mut Loader<'_>, etext: &Etext) -> Result<Document> {
        let lines = loader.load_lines(&etext.id)?;
        let text = match etext.pagination.table() {
            Some(table) => map_pages(&lines, table).annotated,
            None => plain_text(&lines),
        };

        let title = etext.title.clone().unwrap_or_else(|| etext.id.clone());
        let mut body = format!("# {title}\n\n");
        if let Some(author) = &etext.author {
            body.push_str(&format!("## {author} {{.author}}\n\n"));
        }
        body.push_str(&text);
        if !body.ends_with('\n') {
            body.push('\n');
        }

        let owner = etext.item_id.as_deref().and_then(|id| match loader.load_item(id) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!(item = id, error = %e, "owning item unavailable");
                None
            }
        });
        let ocr = owner.as_ref().is_some_and(|item| item.is_ocr(self.config));
        let inputter = owner
            .as_ref()
            .and_then(|item| item.inputter(self.config))
            .map(str::to_string);

        Ok(Document {
            name: document_name(
                NameParts {
                    id: &etext.id,
                    title: &title,
                    volume: 1,
                    total_volumes: 1,
                    ocr,
                },
                self.config,
            ),
            title,
            volume: 1,
            total_volumes: 1,
            author: etext.author.clone(),
            inputter,
            ocr,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::SECTION_BREAK;
    use pecha_source::{MemoryStore, Resource, vocab};

    fn page(seq: i64, line: i64) -> Resource {
        Resource::default()
            .with_integer(vocab::SEQ_NUM, seq)
            .with_integer(vocab::SLICE_START_CHUNK, line)
            .with_integer(vocab::SLICE_START_CHAR, 1)
            .with_integer(vocab::SLICE_END_CHUNK, line)
            .with_integer(vocab::SLICE_END_CHAR, 5)
    }

    fn location(volume: i64, start: i64, end: i64) -> Resource {
        Resource::default()
            .with_integer(vocab::WORK_LOCATION_VOLUME, volume)
            .with_integer(vocab::WORK_LOCATION_PAGE, start)
            .with_integer(vocab::WORK_LOCATION_END_PAGE, end)
    }

    fn volume(number: i64, etext: &str) -> Resource {
        Resource::default().with_integer(vocab::VOLUME_NUMBER, number).with_node(
            vocab::VOLUME_HAS_ETEXT,
            Resource::default().with_reference(vocab::ETEXT_RESOURCE, etext),
        )
    }

    fn person(id: &str, name: &str) -> Resource {
        Resource::new(id).with_node(
            vocab::PERSON_NAME,
            Resource::default()
                .with_kind(vocab::PERSON_PRIMARY_NAME)
                .with_text_in(vocab::LABEL, name, "bo"),
        )
    }

    fn library() -> MemoryStore {
        let work = Resource::new("W1")
            .with_text_in(vocab::PREF_LABEL, "chos", "bo")
            .with_reference(vocab::CREATOR_MAIN_AUTHOR, "P1")
            .with_node(
                vocab::WORK_HAS_PART,
                Resource::new("W1_2")
                    .with_text_in(vocab::PREF_LABEL, "second", "bo")
                    .with_reference(vocab::CREATOR_MAIN_AUTHOR, "P2")
                    .with_node(vocab::WORK_LOCATION, location(1, 2, 2)),
            )
            .with_node(
                vocab::WORK_HAS_PART,
                Resource::new("W1_1")
                    .with_text_in(vocab::PREF_LABEL, "first", "bo")
                    .with_reference(vocab::CREATOR_MAIN_AUTHOR, "P1")
                    .with_node(vocab::WORK_LOCATION, location(1, 1, 1)),
            );
        let item = Resource::new("I1")
            .with_kind(vocab::ITEM_ETEXT_PAGINATED)
            .with_reference(vocab::ITEM_FOR_WORK, "W1")
            .with_reference(vocab::ETEXT_DISTRIBUTOR, "CP009")
            .with_node(vocab::ITEM_HAS_VOLUME, volume(1, "UT1_001"))
            .with_node(vocab::ITEM_HAS_VOLUME, volume(2, "UT1_002"));
        let etext = Resource::new("UT1_001")
            .with_text_in(vocab::ETEXT_TITLE, "vol one", "bo")
            .with_reference(vocab::ETEXT_IN_ITEM, "I1")
            .with_node(vocab::ETEXT_HAS_PAGE, page(1, 1))
            .with_node(vocab::ETEXT_HAS_PAGE, page(2, 2));

        MemoryStore::new()
            .with_resource(work)
            .with_resource(item)
            .with_resource(etext)
            .with_resource(Resource::new("UT1_002"))
            .with_resource(person("P1", "one"))
            .with_resource(person("P2", "two"))
            .with_text("UT1_001", "alpha\nbeta")
    }

    fn config() -> PechaConfig {
        let mut config = PechaConfig::default();
        config.distributors.insert("CP009".into(), "Library".into());
        config.ocr_distributors.insert("CP009".into());
        config
    }

    #[test]
    fn item_yields_one_document_per_readable_volume() {
        let store = library();
        let config = config();
        let assembly = DocumentAssembler::new(&store, &config)
            .assemble("I1")
            .expect("assemble");

        assert_eq!(assembly.documents.len(), 1);
        assert_eq!(assembly.failures.len(), 1);
        assert_eq!(assembly.failures[0].volume, 2);
        assert!(matches!(
            assembly.failures[0].error,
            PechaError::TextNotFound(_)
        ));

        let doc = &assembly.documents[0];
        assert_eq!(doc.name, "OCR_I1_vol_1 chos");
        assert_eq!(doc.total_volumes, 2);
        assert_eq!(doc.inputter.as_deref(), Some("Library"));
        assert!(doc.ocr);
        assert_eq!(
            doc.body,
            "# chos\n\n#### པོད ༡ {.volume}\n\n## first\n\nalpha\n\n## second\n\n[two]{.author}\n\nbeta\n\n"
        );
    }

    #[test]
    fn work_without_parts_and_empty_table_renders_one_section() {
        let store = MemoryStore::new()
            .with_resource(Resource::new("W2"))
            .with_resource(
                Resource::new("I2")
                    .with_reference(vocab::ITEM_FOR_WORK, "W2")
                    .with_node(vocab::ITEM_HAS_VOLUME, volume(1, "UT2_001")),
            )
            .with_resource(Resource::new("UT2_001"))
            .with_text("UT2_001", "Hello\nWorld");
        let config = PechaConfig::default();
        let assembly = DocumentAssembler::new(&store, &config)
            .assemble("I2")
            .expect("assemble");

        assert_eq!(assembly.documents.len(), 1);
        let doc = &assembly.documents[0];
        assert_eq!(doc.body.matches("\n## ").count(), 1);
        assert!(doc.body.contains("## The Text {.enHeader}\n\nHello\nWorld\n"));
        assert_eq!(doc.title, "I2");
        assert_eq!(doc.name, "I2");
    }

    #[test]
    fn unusable_page_table_falls_back_to_one_section() {
        let bad_page = Resource::default()
            .with_text(vocab::SEQ_NUM, "one")
            .with_integer(vocab::SLICE_START_CHUNK, 1)
            .with_integer(vocab::SLICE_START_CHAR, 1)
            .with_integer(vocab::SLICE_END_CHUNK, 1)
            .with_integer(vocab::SLICE_END_CHAR, 5);
        let store = library().with_resource(
            Resource::new("UT1_001")
                .with_reference(vocab::ETEXT_IN_ITEM, "I1")
                .with_node(vocab::ETEXT_HAS_PAGE, page(1, 1))
                .with_node(vocab::ETEXT_HAS_PAGE, bad_page),
        );
        let config = config();
        let assembly = DocumentAssembler::new(&store, &config)
            .assemble("I1")
            .expect("assemble");

        let doc = &assembly.documents[0];
        assert_eq!(doc.body.matches("\n## ").count(), 1);
        assert!(doc.body.contains("## The Text {.enHeader}\n\nalpha\nbeta\n"));
        assert!(!doc.body.contains("## first"));
        assert!(!doc.body.contains("## second"));
    }

    #[test]
    fn standalone_etext_renders_annotated_text() {
        let store = library();
        let config = config();
        let assembly = DocumentAssembler::new(&store, &config)
            .assemble("UT1_001")
            .expect("assemble");

        let doc = &assembly.documents[0];
        assert_eq!(doc.title, "vol one");
        assert_eq!(doc.author.as_deref(), Some("one"));
        assert_eq!(
            doc.body,
            "# vol one\n\n## one {.author}\n\n \\[1\\] alpha\n \\[2\\] beta\n"
        );
        assert_eq!(doc.name, "OCR_UT1_001 vol one");
    }

    #[test]
    fn works_are_not_rendered_directly() {
        let store = library();
        let config = config();
        assert!(matches!(
            DocumentAssembler::new(&store, &config).assemble("W1"),
            Err(PechaError::UnsupportedResource { .. })
        ));
    }

    #[test]
    fn long_leaves_are_chunked() {
        let store = MemoryStore::new()
            .with_resource(
                Resource::new("I3").with_node(vocab::ITEM_HAS_VOLUME, volume(1, "UT3_001")),
            )
            .with_resource(Resource::new("UT3_001"))
            .with_text("UT3_001", &"ཀ".repeat(90));
        let config = PechaConfig {
            max_section_chars: 30,
            ..PechaConfig::default()
        };
        let assembly = DocumentAssembler::new(&store, &config)
            .assemble("I3")
            .expect("assemble");
        assert_eq!(assembly.documents[0].body.matches(SECTION_BREAK).count(), 2);
    }
}
