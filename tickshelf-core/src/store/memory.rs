//! In-process partition store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{ListPage, PartitionStore, StoreError};

/// Objects held in a sorted map, with listings served in fixed-size pages.
///
/// The continuation token is the last common prefix of the previous page, so
/// listings are stable as long as nothing is written between pages.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    page_size: usize,
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    puts: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub const DEFAULT_PAGE_SIZE: usize = 1000;

    pub fn new() -> Self {
        Self::with_page_size(Self::DEFAULT_PAGE_SIZE)
    }

    /// A page size of zero is treated as one.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            name: "memory://".to_string(),
            page_size: page_size.max(1),
            objects: RwLock::new(BTreeMap::new()),
            puts: AtomicUsize::new(0),
        }
    }

    /// Seed an object without counting it as a put.
    pub fn insert(&self, path: impl Into<String>, payload: Vec<u8>) {
        self.write_objects().insert(path.into(), payload);
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.read_objects().get(path).cloned()
    }

    /// All object paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.read_objects().keys().cloned().collect()
    }

    /// Number of `put` calls served so far.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn read_objects(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_objects(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PartitionStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_page(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage, StoreError> {
        let objects = self.read_objects();

        let all: BTreeSet<String> = objects
            .range(prefix.to_string()..)
            .map(|(path, _)| path)
            .take_while(|path| path.starts_with(prefix))
            .filter_map(|path| {
                let rest = &path[prefix.len()..];
                rest.find('/')
                    .map(|slash| format!("{prefix}{}", &rest[..=slash]))
            })
            .collect();

        let mut remaining = all
            .into_iter()
            .filter(|p| continuation.map_or(true, |token| p.as_str() > token));

        let common_prefixes: Vec<String> = remaining.by_ref().take(self.page_size).collect();
        let continuation = if remaining.next().is_some() {
            common_prefixes.last().cloned()
        } else {
            None
        };

        Ok(ListPage {
            common_prefixes,
            continuation,
        })
    }

    fn put(&self, path: &str, payload: Vec<u8>) -> Result<(), StoreError> {
        if path.is_empty() || path.ends_with('/') {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                reason: "object path must name a file".into(),
            });
        }
        self.write_objects().insert(path.to_string(), payload);
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
