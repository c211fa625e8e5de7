//! Module: cache
//! Responsibility: the per-page snapshot store shared by read and write paths.
//! Does not own: deciding when to reload.
//! Boundary: copy-on-read and replace-on-write; snapshots are never patched in place.

use crate::{item::Item, join::JoinOptionSet};
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

///
/// PageSnapshot
///
/// The loaded state of one page: its first window of rows, the exact row
/// count and the candidate rows of every relation picker.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSnapshot {
    pub page_id: String,
    pub rows: Vec<Item>,
    pub total_count: u64,
    pub join_options: BTreeMap<String, JoinOptionSet>,
}

///
/// PageRepository
///
/// `get` hands out an owned copy, so callers may edit freely. `replace`
/// swaps the whole snapshot; concurrent loads of one page are last write wins.
///

pub trait PageRepository: Send + Sync {
    fn get(&self, page_id: &str) -> Option<PageSnapshot>;

    fn replace(&self, page_id: &str, snapshot: PageSnapshot);

    fn remove(&self, page_id: &str) -> Option<PageSnapshot>;
}

///
/// MemoryPageRepository
///

#[derive(Debug, Default)]
pub struct MemoryPageRepository {
    pages: RwLock<BTreeMap<String, PageSnapshot>>,
}

impl MemoryPageRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page_ids(&self) -> Vec<String> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl PageRepository for MemoryPageRepository {
    fn get(&self, page_id: &str) -> Option<PageSnapshot> {
        self.pages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(page_id)
            .cloned()
    }

    fn replace(&self, page_id: &str, snapshot: PageSnapshot) {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page_id.to_string(), snapshot);
    }

    fn remove(&self, page_id: &str) -> Option<PageSnapshot> {
        self.pages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(page_id)
    }
}

///
/// TESTS
///
