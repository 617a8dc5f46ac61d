// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Language-tag equivalence for string lookups.

use std::collections::BTreeMap;

use pecha_core::PechaConfig;

use crate::resource::Literal;

/// Decides which language-tagged literal answers a request for a language.
///
/// A request for `bo` accepts literals tagged `bo` and, failing that, literals
/// in any transliteration scheme registered for `bo` (such as `bo-x-ewts`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageRule {
    transliterations: BTreeMap<String, Vec<String>>,
}

impl LanguageRule {
    pub fn new(transliterations: BTreeMap<String, Vec<String>>) -> Self {
        Self { transliterations }
    }

    pub fn from_config(config: &PechaConfig) -> Self {
        Self::new(config.transliterations.clone())
    }

    /// Whether a literal tagged `tag` satisfies a request for `requested`.
    pub fn accepts(&self, requested: &str, tag: &str) -> bool {
        tag == requested || self.is_transliteration_of(requested, tag)
    }

    fn is_transliteration_of(&self, requested: &str, tag: &str) -> bool {
        self.transliterations
            .get(requested)
            .is_some_and(|schemes| schemes.iter().any(|s| s == tag))
    }

    /// Pick the best literal for `requested`.
    ///
    /// Exact tag first, then a registered transliteration, then the first
    /// literal of any language.
    pub fn select<'a, I>(&self, literals: I, requested: &str) -> Option<&'a Literal>
    where
        I: IntoIterator<Item = &'a Literal>,
    {
        let literals: Vec<&'a Literal> = literals.into_iter().collect();
        let tag = |lit: &Literal| lit.language.as_deref().unwrap_or("").to_string();

        literals
            .iter()
            .copied()
            .find(|lit| tag(*lit) == requested)
            .or_else(|| {
                literals
                    .iter()
                    .copied()
                    .find(|lit| self.is_transliteration_of(requested, &tag(*lit)))
            })
            .or_else(|| literals.first().copied())
    }
}
