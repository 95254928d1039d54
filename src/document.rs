use crate::types::DocumentId;
use bson::Document as BsonDocument;

/// A stored bson document as handed back by a [`crate::store::DocumentStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub data: BsonDocument,
}

impl Document {
    #[must_use]
    pub const fn with_id(id: DocumentId, data: BsonDocument) -> Self {
        Self { id, data }
    }
}
