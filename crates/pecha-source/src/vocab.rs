// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Predicate and type names used in resource records.

// -- Works --
pub const PREF_LABEL: &str = "prefLabel";
pub const WORK_HAS_PART: &str = "workHasPart";
pub const WORK_LOCATION: &str = "workLocation";
pub const WORK_LOCATION_VOLUME: &str = "workLocationVolume";
pub const WORK_LOCATION_PAGE: &str = "workLocationPage";
pub const WORK_LOCATION_END_PAGE: &str = "workLocationEndPage";
pub const CREATOR_MAIN_AUTHOR: &str = "creatorMainAuthor";

// -- Persons --
pub const PERSON_NAME: &str = "personName";
pub const PERSON_PRIMARY_NAME: &str = "PersonPrimaryName";
pub const LABEL: &str = "label";

// -- Items --
pub const ITEM_FOR_WORK: &str = "itemForWork";
pub const ITEM_ETEXT_PAGINATED_FOR_WORK: &str = "itemEtextPaginatedForWork";
pub const ITEM_ETEXT_NON_PAGINATED_FOR_WORK: &str = "itemEtextNonPaginatedForWork";
pub const ITEM_HAS_VOLUME: &str = "itemHasVolume";
pub const VOLUME_NUMBER: &str = "volumeNumber";
pub const VOLUME_HAS_ETEXT: &str = "volumeHasEtext";
pub const ETEXT_RESOURCE: &str = "eTextResource";
pub const ETEXT_DISTRIBUTOR: &str = "eTextDistributor";
pub const ITEM_ETEXT_PAGINATED: &str = "ItemEtextPaginated";
pub const ITEM_ETEXT_NON_PAGINATED: &str = "ItemEtextNonPaginated";

// -- Etexts --
pub const ETEXT_TITLE: &str = "eTextTitle";
pub const ETEXT_IN_ITEM: &str = "eTextInItem";
pub const ETEXT_HAS_PAGE: &str = "eTextHasPage";
pub const SEQ_NUM: &str = "seqNum";
pub const SLICE_START_CHUNK: &str = "sliceStartChunk";
pub const SLICE_START_CHAR: &str = "sliceStartChar";
pub const SLICE_END_CHUNK: &str = "sliceEndChunk";
pub const SLICE_END_CHAR: &str = "sliceEndChar";
