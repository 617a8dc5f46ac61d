// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Typed views over resource records.
//
// `Loader` reads works, items and etexts through a `ResourceAccessor` and
// produces immutable values. Malformed metadata never aborts a load: an
// unusable location drops the location, an unusable page table marks the
// etext as unusable for pagination, and both are logged with the record id.

use std::collections::{BTreeMap, HashMap};

use pecha_core::error::{PechaError, Result};
use pecha_core::{PageMarker, PageTable, PechaConfig, Work, WorkLocation};
use tracing::{debug, instrument, warn};

use crate::accessor::ResourceAccessor;
use crate::kind::{ResourceKind, local_id};
use crate::language::LanguageRule;
use crate::resource::{Link, Resource};
use crate::vocab;

/// A loaded bibliographic resource, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BibResource {
    Work(Work),
    Item(Item),
    Etext(Etext),
}

impl BibResource {
    pub fn id(&self) -> &str {
        match self {
            Self::Work(work) => &work.id,
            Self::Item(item) => &item.id,
            Self::Etext(etext) => &etext.id,
        }
    }
}

/// An instantiation of a work, divided into volumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub kind: Option<String>,
    pub work: Option<Work>,
    /// Ascending by volume number.
    pub volumes: Vec<Volume>,
    /// Distributor code, e.g. `CP001`.
    pub distributor: Option<String>,
}

impl Item {
    pub fn title(&self) -> Option<&str> {
        self.work.as_ref()?.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.work.as_ref()?.author.as_deref()
    }

    pub fn total_volumes(&self) -> u32 {
        self.volumes.len() as u32
    }

    /// Display name of the distributor, through the configured table.
    pub fn inputter<'c>(&self, config: &'c PechaConfig) -> Option<&'c str> {
        config.distributor_name(self.distributor.as_deref()?)
    }

    pub fn is_ocr(&self, config: &PechaConfig) -> bool {
        self.distributor
            .as_deref()
            .is_some_and(|code| config.is_ocr_distributor(code))
    }
}

/// One volume of an item and the etext holding its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub number: u32,
    pub etext_id: String,
}

/// Whether an etext's page table can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    Paginated(PageTable),
    /// No page records at all.
    Unpaginated,
    /// Page records exist but are malformed or inconsistent.
    Unusable { reason: String },
}

impl Pagination {
    /// The page table, if it is non-empty and usable.
    pub fn table(&self) -> Option<&PageTable> {
        match self {
            Self::Paginated(table) if !table.is_empty() => Some(table),
            _ => None,
        }
    }
}

/// The digitized text of one volume.
#[derive(Debug, Clone, PartialEq)]
pub struct Etext {
    pub id: String,
    pub title: Option<String>,
    pub item_id: Option<String>,
    /// Main author of the work the owning item instantiates.
    pub author: Option<String>,
    pub pagination: Pagination,
}

/// Reads typed resources for one unit of work.
///
/// Holds a per-unit author cache; create one loader per unit rather than
/// sharing it between workers.
pub struct Loader<'a> {
    accessor: &'a dyn ResourceAccessor,
    language: LanguageRule,
    preferred: String,
    authors: HashMap<String, Option<String>>,
}

impl<'a> Loader<'a> {
    pub fn new(accessor: &'a dyn ResourceAccessor, config: &PechaConfig) -> Self {
        Self {
            accessor,
            language: LanguageRule::from_config(config),
            preferred: config.preferred_language.clone(),
            authors: HashMap::new(),
        }
    }

    /// Load `id` and dispatch on its kind.
    #[instrument(skip(self))]
    pub fn load(&mut self, id: &str) -> Result<BibResource> {
        match ResourceKind::from_id(local_id(id)) {
            Some(ResourceKind::Work) => self.load_work(id).map(BibResource::Work),
            Some(ResourceKind::Item) => self.load_item(id).map(BibResource::Item),
            Some(ResourceKind::Etext) => self.load_etext(id).map(BibResource::Etext),
            other => Err(PechaError::UnsupportedResource {
                id: id.to_string(),
                reason: match other {
                    Some(kind) => format!("cannot generate documents for {kind:?} resources"),
                    None => "identifier has no known kind prefix".into(),
                },
            }),
        }
    }

    pub fn load_work(&mut self, id: &str) -> Result<Work> {
        let resource = self.require(id)?;
        let mut visiting = Vec::new();
        Ok(self.work_from(&resource, &mut visiting))
    }

    pub fn load_item(&mut self, id: &str) -> Result<Item> {
        let resource = self.require(id)?;

        if let Some(kind) = resource.kind.as_deref()
            && kind != vocab::ITEM_ETEXT_PAGINATED
            && kind != vocab::ITEM_ETEXT_NON_PAGINATED
        {
            return Err(PechaError::UnsupportedResource {
                id: resource.id.clone(),
                reason: format!("item type {kind} has no etexts"),
            });
        }

        let work = [
            vocab::ITEM_FOR_WORK,
            vocab::ITEM_ETEXT_PAGINATED_FOR_WORK,
            vocab::ITEM_ETEXT_NON_PAGINATED_FOR_WORK,
        ]
        .iter()
        .find_map(|predicate| resource.link(predicate))
        .and_then(|link| self.resolve_logged(link, &resource.id))
        .map(|work| self.work_from(&work, &mut Vec::new()));

        if work.is_none() {
            warn!(item = %resource.id, "item has no work; volumes render unstructured");
        }

        let volumes = self.volumes_of(&resource);
        let distributor = resource
            .link(vocab::ETEXT_DISTRIBUTOR)
            .map(|link| local_id(link.id()).to_string());

        debug!(item = %resource.id, volumes = volumes.len(), "item loaded");
        Ok(Item {
            id: resource.id.clone(),
            kind: resource.kind.clone(),
            work,
            volumes,
            distributor,
        })
    }

    pub fn load_etext(&mut self, id: &str) -> Result<Etext> {
        let resource = self.require(id)?;

        let item_id = resource
            .link(vocab::ETEXT_IN_ITEM)
            .map(|link| local_id(link.id()).to_string());
        let author = item_id.as_deref().and_then(|item| self.item_author(item));

        Ok(Etext {
            id: resource.id.clone(),
            title: resource.string_in(vocab::ETEXT_TITLE, &self.preferred, &self.language),
            item_id,
            author,
            pagination: self.pagination_of(&resource),
        })
    }

    /// Lines of etext `id`; a missing text is an error for the unit.
    pub fn load_lines(&self, id: &str) -> Result<Vec<String>> {
        self.accessor
            .load_lines(id)?
            .ok_or_else(|| PechaError::TextNotFound(id.to_string()))
    }

    // -- Records --------------------------------------------------------------

    fn require(&self, id: &str) -> Result<Resource> {
        self.accessor
            .load_resource(id)?
            .ok_or_else(|| PechaError::ResourceNotFound(id.to_string()))
    }

    /// Follow a link: embedded nodes are used in place, references loaded.
    fn resolve(&self, link: Link<'_>) -> Result<Option<Resource>> {
        match link {
            Link::Embedded(node) => Ok(Some(node.clone())),
            Link::Reference(id) => self.accessor.load_resource(id),
        }
    }

    fn resolve_logged(&self, link: Link<'_>, owner: &str) -> Option<Resource> {
        match self.resolve(link) {
            Ok(Some(resource)) => Some(resource),
            Ok(None) => {
                warn!(owner, target = link.id(), "linked resource not found");
                None
            }
            Err(e) => {
                warn!(owner, target = link.id(), error = %e, "failed to load linked resource");
                None
            }
        }
    }

    // -- Works ----------------------------------------------------------------

    fn work_from(&mut self, resource: &Resource, visiting: &mut Vec<String>) -> Work {
        let location = match self.location_of(resource) {
            Ok(location) => location,
            Err(e) => {
                warn!(work = resource.display_id(), error = %e, "unusable work location");
                None
            }
        };

        let mut work = Work {
            id: resource.id.clone(),
            title: resource.string_in(vocab::PREF_LABEL, &self.preferred, &self.language),
            author: self.main_author(resource),
            location,
            parts: Vec::new(),
        };

        if !resource.id.is_empty() {
            visiting.push(resource.id.clone());
        }
        for link in resource.links(vocab::WORK_HAS_PART) {
            let target = local_id(link.id());
            if !target.is_empty() && visiting.iter().any(|id| id == target) {
                warn!(work = %work.id, part = target, "work part cycle; skipping");
                continue;
            }
            if let Some(part) = self.resolve_logged(link, &work.id) {
                let part = self.work_from(&part, visiting);
                work.parts.push(part);
            }
        }
        if !resource.id.is_empty() {
            visiting.pop();
        }

        work
    }

    fn location_of(&self, work: &Resource) -> Result<Option<WorkLocation>> {
        let Some(link) = work.link(vocab::WORK_LOCATION) else {
            return Ok(None);
        };
        let Some(location) = self.resolve(link)? else {
            return Ok(None);
        };

        let start = location
            .integer(vocab::WORK_LOCATION_PAGE)?
            .ok_or_else(|| PechaError::MalformedProperty {
                resource: work.display_id().to_string(),
                predicate: vocab::WORK_LOCATION_PAGE.into(),
                detail: "missing start page".into(),
            })?;
        let start = to_u32(work, vocab::WORK_LOCATION_PAGE, start)?;

        let end = match location.integer(vocab::WORK_LOCATION_END_PAGE)? {
            Some(end) => to_u32(work, vocab::WORK_LOCATION_END_PAGE, end)?,
            None => start,
        };
        let volume = match location.integer(vocab::WORK_LOCATION_VOLUME)? {
            Some(volume) => to_u32(work, vocab::WORK_LOCATION_VOLUME, volume)?,
            None => 1,
        };

        if end < start {
            return Err(PechaError::MalformedProperty {
                resource: work.display_id().to_string(),
                predicate: vocab::WORK_LOCATION_END_PAGE.into(),
                detail: format!("end page {end} precedes start page {start}"),
            });
        }

        Ok(Some(WorkLocation::new(volume, start, end)))
    }

    // -- Authors --------------------------------------------------------------

    fn main_author(&mut self, work: &Resource) -> Option<String> {
        let link = work.link(vocab::CREATOR_MAIN_AUTHOR)?;
        let id = local_id(link.id()).to_string();
        if !id.is_empty()
            && let Some(cached) = self.authors.get(&id)
        {
            return cached.clone();
        }

        let name = self
            .resolve_logged(link, work.display_id())
            .and_then(|person| self.primary_name(&person));
        if !id.is_empty() {
            self.authors.insert(id, name.clone());
        }
        name
    }

    fn primary_name(&self, person: &Resource) -> Option<String> {
        person
            .links(vocab::PERSON_NAME)
            .into_iter()
            .filter_map(|link| self.resolve_logged(link, person.display_id()))
            .find(|name| name.is_kind(vocab::PERSON_PRIMARY_NAME))
            .and_then(|name| name.string_in(vocab::LABEL, &self.preferred, &self.language))
    }

    fn item_author(&mut self, item_id: &str) -> Option<String> {
        let item = match self.accessor.load_resource(item_id) {
            Ok(Some(item)) => item,
            Ok(None) => {
                debug!(item = item_id, "owning item not found; etext has no author");
                return None;
            }
            Err(e) => {
                warn!(item = item_id, error = %e, "failed to load owning item");
                return None;
            }
        };
        let link = [
            vocab::ITEM_FOR_WORK,
            vocab::ITEM_ETEXT_PAGINATED_FOR_WORK,
            vocab::ITEM_ETEXT_NON_PAGINATED_FOR_WORK,
        ]
        .iter()
        .find_map(|predicate| item.link(predicate))?;
        let work = self.resolve_logged(link, item_id)?;
        self.main_author(&work)
    }

    // -- Items ----------------------------------------------------------------

    fn volumes_of(&self, item: &Resource) -> Vec<Volume> {
        let mut volumes = BTreeMap::new();

        for link in item.links(vocab::ITEM_HAS_VOLUME) {
            let Some(volume) = self.resolve_logged(link, &item.id) else {
                continue;
            };
            let number = match volume
                .integer(vocab::VOLUME_NUMBER)
                .and_then(|n| n.map(|n| to_u32(&volume, vocab::VOLUME_NUMBER, n)).transpose())
            {
                Ok(Some(number)) => number,
                Ok(None) => {
                    warn!(item = %item.id, volume = volume.display_id(), "volume has no number");
                    continue;
                }
                Err(e) => {
                    warn!(item = %item.id, error = %e, "unusable volume number");
                    continue;
                }
            };

            for etext_link in volume.links(vocab::VOLUME_HAS_ETEXT) {
                let Some(volume_etext) = self.resolve_logged(etext_link, &item.id) else {
                    continue;
                };
                if let Some(text) = volume_etext.link(vocab::ETEXT_RESOURCE) {
                    volumes.insert(number, local_id(text.id()).to_string());
                }
            }
        }

        volumes
            .into_iter()
            .map(|(number, etext_id)| Volume { number, etext_id })
            .collect()
    }

    // -- Etexts ---------------------------------------------------------------

    fn pagination_of(&self, etext: &Resource) -> Pagination {
        let links = etext.links(vocab::ETEXT_HAS_PAGE);
        if links.is_empty() {
            return Pagination::Unpaginated;
        }

        let markers: Result<Vec<PageMarker>> = links
            .into_iter()
            .map(|link| {
                let page = self.resolve(link)?.ok_or_else(|| PechaError::MalformedPageTable {
                    etext: etext.id.clone(),
                    detail: format!("page record {} not found", link.id()),
                })?;
                page_marker(&etext.id, &page)
            })
            .collect();

        match markers.and_then(PageTable::new) {
            Ok(table) => Pagination::Paginated(table),
            Err(e) => {
                warn!(etext = %etext.id, error = %e, "page table unusable; rendering unpaginated");
                Pagination::Unusable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn page_marker(etext: &str, page: &Resource) -> Result<PageMarker> {
    let field = |predicate: &str| -> Result<u32> {
        let value = page
            .integer(predicate)
            .map_err(|e| PechaError::MalformedPageTable {
                etext: etext.to_string(),
                detail: e.to_string(),
            })?
            .ok_or_else(|| PechaError::MalformedPageTable {
                etext: etext.to_string(),
                detail: format!("page record is missing {predicate}"),
            })?;
        u32::try_from(value).map_err(|_| PechaError::MalformedPageTable {
            etext: etext.to_string(),
            detail: format!("{predicate} out of range: {value}"),
        })
    };

    Ok(PageMarker {
        sequence: field(vocab::SEQ_NUM)?,
        start_line: field(vocab::SLICE_START_CHUNK)?,
        start_char: field(vocab::SLICE_START_CHAR)?,
        end_line: field(vocab::SLICE_END_CHUNK)?,
        end_char: field(vocab::SLICE_END_CHAR)?,
    })
}

fn to_u32(resource: &Resource, predicate: &str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| PechaError::MalformedProperty {
        resource: resource.display_id().to_string(),
        predicate: predicate.to_string(),
        detail: format!("out of range: {value}"),
    })
}
