//! Field path resolution for action documents.
//!
//! Query code never spells storage keys by hand. It names a typed field and asks for its
//! [`FieldPath`], so the key layout below is the single source of truth.

use crate::errors::ActionError;
use crate::view::ViewNamespace;
use std::fmt;

pub(crate) const MAX_PATH_DEPTH: usize = 32;

pub const ID: &str = "id";
pub const APPLICATION_ID: &str = "applicationId";
pub const PAGE_ID: &str = "pageId";
pub const DELETED: &str = "deleted";
pub const POLICIES: &str = "policies";
pub const NAME: &str = "name";
pub const EXECUTE_ON_LOAD: &str = "executeOnLoad";
pub const USER_SET_ON_LOAD: &str = "userSetOnLoad";
pub const ACTION_CONFIGURATION: &str = "actionConfiguration";
pub const HTTP_METHOD: &str = "httpMethod";
pub const PATH: &str = "path";

/// Fields that exist once per view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewField {
    Name,
    PageId,
    ExecuteOnLoad,
    UserSetOnLoad,
    HttpMethod,
    Path,
}

impl ViewField {
    #[must_use]
    pub const fn segments(self) -> &'static [&'static str] {
        match self {
            Self::Name => &[NAME],
            Self::PageId => &[PAGE_ID],
            Self::ExecuteOnLoad => &[EXECUTE_ON_LOAD],
            Self::UserSetOnLoad => &[USER_SET_ON_LOAD],
            Self::HttpMethod => &[ACTION_CONFIGURATION, HTTP_METHOD],
            Self::Path => &[ACTION_CONFIGURATION, PATH],
        }
    }

    #[must_use]
    pub fn under(self, view: ViewNamespace) -> FieldPath {
        FieldPath::from_segments(std::iter::once(view.root()).chain(self.segments().iter().copied()))
    }
}

/// Any addressable field of an action document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionField {
    Id,
    ApplicationId,
    PageId,
    Deleted,
    Policies,
    View(ViewNamespace, ViewField),
}

impl ActionField {
    #[must_use]
    pub fn path(self) -> FieldPath {
        match self {
            Self::Id => FieldPath::from_segments([ID]),
            Self::ApplicationId => FieldPath::from_segments([APPLICATION_ID]),
            Self::PageId => FieldPath::from_segments([PAGE_ID]),
            Self::Deleted => FieldPath::from_segments([DELETED]),
            Self::Policies => FieldPath::from_segments([POLICIES]),
            Self::View(view, field) => field.under(view),
        }
    }
}

impl From<ActionField> for FieldPath {
    fn from(f: ActionField) -> Self {
        f.path()
    }
}

/// A resolved storage path such as `unpublishedAction.actionConfiguration.httpMethod`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(String);

impl FieldPath {
    /// Joins schema segments. Segments come from the constants above, so no validation runs here.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = String::new();
        for s in segments {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(s.as_ref());
        }
        Self(out)
    }

    /// Accepts a caller-supplied dotted path after checking it is well formed.
    ///
    /// # Errors
    /// Returns `ActionError::InvalidFieldPath` for empty paths, empty segments, operator-like
    /// segments (`$...`), NUL bytes, or nesting deeper than the evaluator supports.
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        check_path(raw)?;
        Ok(Self(raw.to_string()))
    }

    /// Path of a field nested under this one, e.g. `policies` + `permission`.
    #[must_use]
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}.{segment}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Errors
/// Returns `ActionError::InvalidFieldPath` describing the first problem found.
pub fn check_path(raw: &str) -> Result<(), ActionError> {
    let bad = |reason: &'static str| -> Result<(), ActionError> {
        Err(ActionError::InvalidFieldPath { path: raw.to_string(), reason })
    };
    if raw.is_empty() {
        return bad("empty path");
    }
    if raw.contains('\0') {
        return bad("contains NUL");
    }
    let mut depth = 0usize;
    for seg in raw.split('.') {
        depth += 1;
        if seg.is_empty() {
            return bad("empty segment");
        }
        if seg.starts_with('$') {
            return bad("segment starts with `$`");
        }
    }
    if depth > MAX_PATH_DEPTH {
        return bad("nested too deeply");
    }
    Ok(())
}
