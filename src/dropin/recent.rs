//! Recently viewed products

use crate::search::SearchResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// A product the shopper selected from the results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProduct {
    #[serde(flatten)]
    pub product: SearchResult,
    pub viewed_at: DateTime<Utc>,
}

/// Bounded, most-recent-first list of selected products, unique by objectID
#[derive(Debug, Clone)]
pub struct RecentProducts {
    capacity: usize,
    items: VecDeque<RecentProduct>,
}

impl RecentProducts {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, product: SearchResult) {
        self.record_at(product, Utc::now());
    }

    /// Record a view at a given time, moving an existing entry to the front
    pub fn record_at(&mut self, product: SearchResult, viewed_at: DateTime<Utc>) {
        self.items
            .retain(|item| item.product.object_id != product.object_id);
        self.items.push_front(RecentProduct { product, viewed_at });
        self.items.truncate(self.capacity);
    }

    pub fn items(&self) -> impl Iterator<Item = &RecentProduct> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for RecentProducts {
    fn default() -> Self {
        Self::new(10)
    }
}
