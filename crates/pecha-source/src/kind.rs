// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Resource kinds, derived from the identifier prefix.

/// Kind of a bibliographic resource.
///
/// Identifiers carry their kind in a one- or two-letter uppercase prefix
/// (`W22084` is a work, `UT4CZ5369_I1KG9127_0000` an etext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Corporation,
    Etext,
    Item,
    Lineage,
    Office,
    Person,
    Place,
    Product,
    Topic,
    Work,
}

impl ResourceKind {
    /// Infer the kind of `id` from its prefix.
    pub fn from_id(id: &str) -> Option<Self> {
        let prefix_len = id
            .bytes()
            .take(2)
            .take_while(|b| b.is_ascii_uppercase())
            .count();
        Self::from_prefix(&id[..prefix_len])
            .or_else(|| (prefix_len == 2).then(|| Self::from_prefix(&id[..1])).flatten())
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "C" => Some(Self::Corporation),
            "UT" => Some(Self::Etext),
            "I" => Some(Self::Item),
            "L" => Some(Self::Lineage),
            "R" => Some(Self::Office),
            "P" => Some(Self::Person),
            "G" => Some(Self::Place),
            "PR" => Some(Self::Product),
            "T" => Some(Self::Topic),
            "W" => Some(Self::Work),
            _ => None,
        }
    }

    /// Directory holding records of this kind in a `FileStore`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Corporation => "corporations",
            Self::Etext => "etexts",
            Self::Item => "items",
            Self::Lineage => "lineages",
            Self::Office => "offices",
            Self::Person => "persons",
            Self::Place => "places",
            Self::Product => "products",
            Self::Topic => "topics",
            Self::Work => "works",
        }
    }
}

/// Last path segment of an identifier or IRI, without a record extension.
///
/// `http://purl.bdrc.io/resource/W22084` and `W22084.json` both become
/// `W22084`.
pub fn local_id(iri: &str) -> &str {
    let segment = iri
        .trim_end_matches('/')
        .rsplit(['/', '#'])
        .next()
        .unwrap_or(iri);
    segment
        .strip_suffix(".json")
        .or_else(|| segment.strip_suffix(".ttl"))
        .unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letter_prefixes() {
        assert_eq!(ResourceKind::from_id("W22084"), Some(ResourceKind::Work));
        assert_eq!(ResourceKind::from_id("I1KG9127"), Some(ResourceKind::Item));
        assert_eq!(ResourceKind::from_id("P1583"), Some(ResourceKind::Person));
    }

    #[test]
    fn two_letter_prefixes() {
        assert_eq!(
            ResourceKind::from_id("UT4CZ5369_I1KG9127_0000"),
            Some(ResourceKind::Etext)
        );
        assert_eq!(ResourceKind::from_id("PR88"), Some(ResourceKind::Product));
    }

    #[test]
    fn unknown_two_letter_prefix_falls_back_to_first_letter() {
        assert_eq!(ResourceKind::from_id("IE0123"), Some(ResourceKind::Item));
        assert_eq!(ResourceKind::from_id("CP009"), Some(ResourceKind::Corporation));
    }

    #[test]
    fn unknown_prefix() {
        assert_eq!(ResourceKind::from_id("XY12"), None);
        assert_eq!(ResourceKind::from_id("12"), None);
        assert_eq!(ResourceKind::from_id(""), None);
    }

    #[test]
    fn local_id_strips_iri_and_extension() {
        assert_eq!(local_id("http://purl.bdrc.io/resource/W22084"), "W22084");
        assert_eq!(local_id("W22084.json"), "W22084");
        assert_eq!(local_id("CP009"), "CP009");
    }
}
