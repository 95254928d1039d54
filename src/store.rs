//! Document store collaborator.
//!
//! [`DocumentStore`] is the execution primitive the repository dispatches compiled filters to.
//! [`MemoryStore`] evaluates filters in-process over bson documents.

use parking_lot::RwLock;
use std::future::Future;

use crate::action::Action;
use crate::document::Document;
use crate::errors::{ActionError, StoreError};
use crate::query::{Cursor, Filter, FindOptions, compare_docs, eval_filter};
use crate::types::{CollectionName, DocumentId};

pub trait DocumentStore: Send + Sync {
    /// Runs `filter` with `opts` and returns every matching document.
    ///
    /// The filter already carries authorization; stores must not drop or widen any part of it.
    fn find(
        &self,
        filter: &Filter,
        opts: &FindOptions,
    ) -> impl Future<Output = Result<Cursor, StoreError>> + Send;
}

/// In-process store. Documents keep insertion order, which is the "storage default" order
/// when no sort is requested.
pub struct MemoryStore {
    name: CollectionName,
    docs: RwLock<Vec<Document>>,
    max_result_limit: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), docs: RwLock::new(Vec::new()), max_result_limit: 10_000 }
    }

    #[must_use]
    pub const fn with_max_result_limit(mut self, limit: usize) -> Self {
        self.max_result_limit = limit;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or replaces the document with the same id.
    pub fn upsert(&self, document: Document) -> DocumentId {
        let id = document.id.clone();
        let mut docs = self.docs.write();
        if let Some(existing) = docs.iter_mut().find(|d| d.id == id) {
            *existing = document;
        } else {
            docs.push(document);
        }
        id
    }

    /// # Errors
    /// Returns `ActionError::Decode` if the action cannot be encoded.
    pub fn upsert_action(&self, action: &Action) -> Result<DocumentId, ActionError> {
        Ok(self.upsert(action.to_document()?))
    }

    pub fn delete(&self, id: &DocumentId) -> bool {
        let mut docs = self.docs.write();
        let before = docs.len();
        docs.retain(|d| &d.id != id);
        docs.len() != before
    }

    #[must_use]
    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.docs.read().iter().find(|d| &d.id == id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Synchronous core of [`DocumentStore::find`].
    #[must_use]
    pub fn find_now(&self, filter: &Filter, opts: &FindOptions) -> Cursor {
        let bench_start = std::time::Instant::now();
        let mut docs: Vec<Document> =
            self.docs.read().iter().filter(|d| eval_filter(&d.data, filter)).cloned().collect();
        let matched = docs.len();

        if let Some(sort) = opts.sort.as_deref().filter(|s| !s.is_empty()) {
            // Stable sort: ties keep insertion order.
            docs.sort_by(|a, b| compare_docs(&a.data, &b.data, sort));
        }

        let skip = opts.skip.unwrap_or(0);
        let docs: Vec<Document> = match opts.limit {
            Some(limit) => docs.into_iter().skip(skip).take(limit.min(self.max_result_limit)).collect(),
            None => docs.into_iter().skip(skip).collect(),
        };
        crate::dev6!(
            "{{\"bench\":\"store\",\"op\":\"find\",\"collection\":\"{}\",\"duration_us\":{},\"matched\":{},\"returned\":{}}}",
            self.name,
            bench_start.elapsed().as_micros(),
            matched,
            docs.len()
        );
        Cursor::new(docs)
    }
}

impl DocumentStore for MemoryStore {
    async fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Cursor, StoreError> {
        Ok(self.find_now(filter, opts))
    }
}
