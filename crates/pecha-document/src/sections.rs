// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Section builder.
//
// Resolves a work's nested parts against one volume's page content map and
// produces a forest of sections. Nodes live in an arena and refer to each
// other by index; the forest is built bottom-up and never mutated once
// `build_sections` returns.

use pecha_core::{Work, WorkLocation};
use tracing::{debug, warn};

use crate::pages::PageContentMap;

/// Index of a section inside its [`SectionForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(usize);

/// A section holds text or children, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Leaf(String),
    Internal(Vec<SectionId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    /// Set only when it differs from the nearest ancestor's author.
    pub author: Option<String>,
    pub location: Option<WorkLocation>,
    pub parent: Option<SectionId>,
    pub body: SectionBody,
}

impl Section {
    pub fn is_leaf(&self) -> bool {
        matches!(self.body, SectionBody::Leaf(_))
    }

    pub fn content(&self) -> Option<&str> {
        match &self.body {
            SectionBody::Leaf(text) => Some(text),
            SectionBody::Internal(_) => None,
        }
    }

    pub fn children(&self) -> &[SectionId] {
        match &self.body {
            SectionBody::Leaf(_) => &[],
            SectionBody::Internal(children) => children,
        }
    }

    fn start_page(&self) -> u32 {
        self.location.map_or(0, |loc| loc.start_page)
    }
}

/// Ordered sections of one volume.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionForest {
    nodes: Vec<Section>,
    roots: Vec<SectionId>,
    skipped: Vec<String>,
    fallback: bool,
}

impl SectionForest {
    /// A single leaf holding the whole volume text.
    pub fn fallback(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            nodes: vec![Section {
                title: Some(title.into()),
                author: None,
                location: None,
                parent: None,
                body: SectionBody::Leaf(text.into()),
            }],
            roots: vec![SectionId(0)],
            skipped: Vec::new(),
            fallback: true,
        }
    }

    pub fn roots(&self) -> &[SectionId] {
        &self.roots
    }

    pub fn get(&self, id: SectionId) -> &Section {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether this is the single-section rendering of an unstructured volume.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Ids of parts left out because their pages were missing from the map.
    pub fn skipped_parts(&self) -> &[String] {
        &self.skipped
    }

    /// All sections in depth-first order, with their depth (roots at 0).
    pub fn walk(&self) -> Vec<(usize, SectionId)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, SectionId)> =
            self.roots.iter().rev().map(|&id| (0, id)).collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.get(id).children().iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Build the sections of `volume` for `work`.
///
/// Parts of the work located in `volume` become sections; a part whose page
/// range is not fully present in `pages` is skipped together with its
/// sub-parts. When nothing is selected the forest falls back to a single
/// section titled `fallback_title` holding `full_text`.
pub fn build_sections(
    work: &Work,
    volume: u32,
    pages: &PageContentMap,
    full_text: &str,
    fallback_title: &str,
) -> SectionForest {
    let mut builder = Builder {
        pages,
        volume,
        nodes: Vec::new(),
        skipped: Vec::new(),
    };
    let roots = builder.build_level(work, work.author.as_deref());

    if roots.is_empty() {
        debug!(
            work = %work.id,
            volume,
            skipped = builder.skipped.len(),
            "no parts for volume; using a single section"
        );
        let mut forest = SectionForest::fallback(fallback_title, full_text);
        forest.skipped = builder.skipped;
        return forest;
    }

    SectionForest {
        nodes: builder.nodes,
        roots,
        skipped: builder.skipped,
        fallback: false,
    }
}

struct Builder<'a> {
    pages: &'a PageContentMap,
    volume: u32,
    nodes: Vec<Section>,
    skipped: Vec<String>,
}

impl Builder<'_> {
    fn build_level(&mut self, work: &Work, ancestor_author: Option<&str>) -> Vec<SectionId> {
        let mut ids: Vec<SectionId> = work
            .parts_in_volume(self.volume)
            .filter_map(|part| self.build_part(part, ancestor_author))
            .collect();
        ids.sort_by_key(|id| self.nodes[id.0].start_page());
        ids
    }

    fn build_part(&mut self, part: &Work, ancestor_author: Option<&str>) -> Option<SectionId> {
        let location = part.location?;
        let Some(content) = self
            .pages
            .slice_range(location.start_page, location.end_page)
        else {
            warn!(
                part = %part.id,
                volume = self.volume,
                start_page = location.start_page,
                end_page = location.end_page,
                "pages missing from the etext; skipping part"
            );
            self.skipped.push(part.id.clone());
            return None;
        };

        let author = part.author.as_deref();
        let shown = match (author, ancestor_author) {
            (Some(own), Some(inherited)) if own == inherited => None,
            (own, _) => own.map(str::to_string),
        };

        let children = self.build_level(part, author.or(ancestor_author));
        let body = if children.is_empty() {
            SectionBody::Leaf(content)
        } else {
            SectionBody::Internal(children.clone())
        };

        let id = SectionId(self.nodes.len());
        self.nodes.push(Section {
            title: part.title.clone(),
            author: shown,
            location: Some(location),
            parent: None,
            body,
        });
        for child in children {
            self.nodes[child.0].parent = Some(id);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::map_pages;
    use pecha_core::{PageMarker, PageTable};

    /// Ten one-line pages, page N holding the line "pN".
    fn ten_pages() -> PageContentMap {
        let lines: Vec<String> = (1..=10).map(|n| format!("p{n}")).collect();
        let markers = (1..=10)
            .map(|n| PageMarker {
                sequence: n,
                start_line: n,
                start_char: 1,
                end_line: n,
                end_char: 3,
            })
            .collect();
        map_pages(&lines, &PageTable::new(markers).expect("table")).pages
    }

    fn part(id: &str, start: u32, end: u32) -> Work {
        Work::new(id)
            .with_title(id)
            .with_location(WorkLocation::new(1, start, end))
    }

    fn titles(forest: &SectionForest) -> Vec<String> {
        forest
            .walk()
            .into_iter()
            .filter_map(|(_, id)| forest.get(id).title.clone())
            .collect()
    }

    #[test]
    fn siblings_are_ordered_by_start_page() {
        let work = Work::new("W1")
            .with_part(part("second", 6, 10))
            .with_part(part("first", 1, 5));
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");

        assert_eq!(titles(&forest), vec!["first", "second"]);
        let first = forest.get(forest.roots()[0]);
        assert_eq!(first.content(), Some("p1\np2\np3\np4\np5\n"));
    }

    #[test]
    fn nested_parts_make_internal_nodes() {
        let work = Work::new("W1").with_part(
            part("outer", 1, 4)
                .with_part(part("b", 3, 4))
                .with_part(part("a", 1, 2)),
        );
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");

        let outer_id = forest.roots()[0];
        let outer = forest.get(outer_id);
        assert!(!outer.is_leaf());
        assert_eq!(outer.content(), None);
        assert_eq!(titles(&forest), vec!["outer", "a", "b"]);
        for &child in outer.children() {
            assert_eq!(forest.get(child).parent, Some(outer_id));
            assert!(forest.get(child).is_leaf());
        }
    }

    #[test]
    fn every_section_is_leaf_or_internal() {
        let work = Work::new("W1")
            .with_part(part("x", 1, 6).with_part(part("y", 1, 3).with_part(part("z", 2, 2))))
            .with_part(part("w", 7, 10));
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");

        for (_, id) in forest.walk() {
            let section = forest.get(id);
            assert_ne!(section.content().is_some(), !section.children().is_empty());
        }
    }

    #[test]
    fn repeated_author_is_suppressed() {
        let work = Work::new("W1").with_author("A").with_part(
            part("same", 1, 2)
                .with_author("A")
                .with_part(part("other", 1, 1).with_author("B"))
                .with_part(part("inherit", 2, 2)),
        );
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");

        let outer = forest.get(forest.roots()[0]);
        assert_eq!(outer.author, None);
        let authors: Vec<Option<&str>> = outer
            .children()
            .iter()
            .map(|&id| forest.get(id).author.as_deref())
            .collect();
        assert_eq!(authors, vec![Some("B"), None]);
    }

    #[test]
    fn suppression_uses_nearest_named_ancestor() {
        let work = Work::new("W1").with_author("A").with_part(
            part("anonymous", 1, 2).with_part(part("child", 1, 1).with_author("A")),
        );
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");
        let child = forest.get(forest.get(forest.roots()[0]).children()[0]);
        assert_eq!(child.author, None);
    }

    #[test]
    fn parts_with_missing_pages_are_skipped() {
        let work = Work::new("W1")
            .with_part(part("present", 1, 2))
            .with_part(part("gap", 9, 12));
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");

        assert_eq!(titles(&forest), vec!["present"]);
        assert_eq!(forest.skipped_parts(), ["gap".to_string()]);
    }

    #[test]
    fn parts_in_other_volumes_are_ignored() {
        let work = Work::new("W1")
            .with_part(part("here", 1, 1))
            .with_part(Work::new("there").with_location(WorkLocation::new(2, 1, 1)));
        let forest = build_sections(&work, 1, &ten_pages(), "", "fallback");
        assert_eq!(titles(&forest), vec!["here"]);
    }

    #[test]
    fn work_without_parts_falls_back() {
        let forest = build_sections(&Work::new("W1"), 1, &ten_pages(), "Hello\nWorld", "The Text");

        assert!(forest.is_fallback());
        assert_eq!(forest.roots().len(), 1);
        let only = forest.get(forest.roots()[0]);
        assert_eq!(only.title.as_deref(), Some("The Text"));
        assert_eq!(only.content(), Some("Hello\nWorld"));
    }

    #[test]
    fn all_parts_skipped_falls_back() {
        let work = Work::new("W1").with_part(part("gap", 20, 30));
        let forest = build_sections(&work, 1, &ten_pages(), "text", "The Text");

        assert!(forest.is_fallback());
        assert_eq!(forest.skipped_parts().len(), 1);
    }
}
