use crate::document::Document;
use std::collections::VecDeque;

/// Forward-only cursor over documents a store matched.
///
/// Documents are captured when the predicate is evaluated; iterating never re-reads the store,
/// so a document cannot change under an authorization decision already made.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    docs: VecDeque<Document>,
}

impl Cursor {
    #[must_use]
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs: docs.into() }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn advance(&mut self) -> Option<Document> {
        self.docs.pop_front()
    }

    /// Documents not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn to_vec(self) -> Vec<Document> {
        self.docs.into()
    }
}

impl Iterator for Cursor {
    type Item = Document;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.docs.len(), Some(self.docs.len()))
    }
}
