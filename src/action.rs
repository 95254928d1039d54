//! Typed view of a stored action document.
//!
//! The serde layout here is what [`crate::schema`] addresses; keep the two in step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::document::Document;
use crate::errors::ActionError;
use crate::types::DocumentId;
use crate::view::ViewNamespace;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// One of the two per-action snapshots (draft or published).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_on_load: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_set_on_load: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_configuration: Option<ActionConfiguration>,
}

impl ActionView {
    #[must_use]
    pub fn named(name: &str, page_id: &str) -> Self {
        Self { name: Some(name.to_string()), page_id: Some(page_id.to_string()), ..Self::default() }
    }

    #[must_use]
    pub const fn execute_on_load(mut self, on: bool) -> Self {
        self.execute_on_load = Some(on);
        self
    }

    #[must_use]
    pub const fn user_set_on_load(mut self, on: bool) -> Self {
        self.user_set_on_load = Some(on);
        self
    }

    #[must_use]
    pub fn http_method(mut self, method: &str) -> Self {
        self.action_configuration
            .get_or_insert_with(ActionConfiguration::default)
            .http_method = Some(method.to_string());
        self
    }
}

/// An access grant stored on the document and read only by the permission evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub permission: String,
    #[serde(default)]
    pub users: BTreeSet<String>,
    #[serde(default)]
    pub groups: BTreeSet<String>,
}

impl Policy {
    #[must_use]
    pub fn for_users<I, S>(permission: &str, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { permission: permission.to_string(), users: users.into_iter().map(Into::into).collect(), groups: BTreeSet::new() }
    }

    #[must_use]
    pub fn for_groups<I, S>(permission: &str, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { permission: permission.to_string(), users: BTreeSet::new(), groups: groups.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpublished_action: Option<ActionView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_action: Option<ActionView>,
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl Action {
    #[must_use]
    pub fn new(application_id: &str) -> Self {
        Self { application_id: Some(application_id.to_string()), ..Self::default() }
    }

    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = DocumentId::from(id);
        self
    }

    #[must_use]
    pub fn with_view(mut self, view: ViewNamespace, body: ActionView) -> Self {
        match view {
            ViewNamespace::Unpublished => self.unpublished_action = Some(body),
            ViewNamespace::Published => self.published_action = Some(body),
        }
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    #[must_use]
    pub const fn mark_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    #[must_use]
    pub const fn view(&self, view: ViewNamespace) -> Option<&ActionView> {
        match view {
            ViewNamespace::Unpublished => self.unpublished_action.as_ref(),
            ViewNamespace::Published => self.published_action.as_ref(),
        }
    }

    /// # Errors
    /// Returns `ActionError::Decode` if the action cannot be encoded as bson.
    pub fn to_document(&self) -> Result<Document, ActionError> {
        let data = bson::serialize_to_document(self)?;
        Ok(Document::with_id(self.id.clone(), data))
    }

    /// # Errors
    /// Returns `ActionError::Decode` if the stored document does not have the action layout.
    pub fn from_document(doc: &Document) -> Result<Self, ActionError> {
        Ok(bson::deserialize_from_document(doc.data.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::get_path;

    #[test]
    fn bson_layout_matches_schema_paths() {
        let action = Action::new("app1")
            .with_id("a-1")
            .with_view(ViewNamespace::Unpublished, ActionView::named("getUsers", "p1").http_method("GET"))
            .with_policy(Policy::for_users("read:actions", ["ann"]));
        let doc = action.to_document().unwrap();
        assert_eq!(doc.id.as_str(), "a-1");
        assert_eq!(
            get_path(&doc.data, "unpublishedAction.actionConfiguration.httpMethod"),
            Some(&bson::Bson::String("GET".into()))
        );
        assert_eq!(get_path(&doc.data, "applicationId"), Some(&bson::Bson::String("app1".into())));
        assert!(get_path(&doc.data, "publishedAction").is_none());
        assert!(get_path(&doc.data, "deleted").is_none());
    }

    #[test]
    fn document_decodes_back_to_the_same_action() {
        let action = Action::new("app1")
            .with_view(ViewNamespace::Published, ActionView::named("q", "p2").execute_on_load(true))
            .mark_deleted();
        let back = Action::from_document(&action.to_document().unwrap()).unwrap();
        assert_eq!(back, action);
    }
}
