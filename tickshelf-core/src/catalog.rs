//! Partition catalog reader.
//!
//! Lists the date partitions already materialized for a symbol. The listing is
//! followed through every continuation token: a date that is only on a later
//! page must still be excluded by the delta filter.

use std::collections::HashSet;

use crate::domain::ExistingPartitionSet;
use crate::store::{PartitionLayout, PartitionStore, StoreError};

/// Reads the catalog snapshot for one symbol at a time.
pub struct CatalogReader<'a> {
    store: &'a dyn PartitionStore,
    layout: &'a PartitionLayout,
    max_pages: usize,
}

impl<'a> CatalogReader<'a> {
    pub const DEFAULT_MAX_PAGES: usize = 100_000;

    pub fn new(store: &'a dyn PartitionStore, layout: &'a PartitionLayout) -> Self {
        Self {
            store,
            layout,
            max_pages: Self::DEFAULT_MAX_PAGES,
        }
    }

    /// Upper bound on pages fetched for one symbol before giving up.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Every date segment under `{prefix}/{symbol}/`.
    ///
    /// No prior partitions yields an empty set, not an error.
    pub fn existing_partitions(&self, symbol: &str) -> Result<ExistingPartitionSet, CatalogError> {
        let prefix = self.layout.symbol_prefix(symbol);
        let mut dates = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut continuation: Option<String> = None;
        let mut pages = 0;

        loop {
            if pages == self.max_pages {
                return Err(CatalogError::Unbounded {
                    symbol: symbol.to_string(),
                    pages,
                });
            }

            let page = self.store.list_page(&prefix, continuation.as_deref())?;
            pages += 1;

            dates.extend(
                page.common_prefixes
                    .iter()
                    .filter_map(|p| PartitionLayout::date_segment(p))
                    .map(str::to_string),
            );

            match page.continuation {
                None => break,
                Some(token) => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(CatalogError::RepeatedToken {
                            symbol: symbol.to_string(),
                            token,
                        });
                    }
                    continuation = Some(token);
                }
            }
        }

        Ok(ExistingPartitionSet::new(symbol, dates))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("catalog listing for {symbol} did not finish after {pages} pages")]
    Unbounded { symbol: String, pages: usize },

    #[error("catalog listing for {symbol} repeated continuation token {token}")]
    RepeatedToken { symbol: String, token: String },
}
