//! Draft/published view selection.
//!
//! Every action carries two structurally identical views. A query targets exactly one of them,
//! chosen here from the caller's `view_mode` flag.

use crate::schema::{FieldPath, ViewField};
use serde::{Deserialize, Serialize};

pub const UNPUBLISHED_ROOT: &str = "unpublishedAction";
pub const PUBLISHED_ROOT: &str = "publishedAction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewNamespace {
    /// Draft state edited in the builder.
    Unpublished,
    /// Last published snapshot served to viewers.
    Published,
}

impl ViewNamespace {
    /// `true` selects the published view, `false` the draft view.
    #[must_use]
    pub const fn select(view_mode: bool) -> Self {
        if view_mode { Self::Published } else { Self::Unpublished }
    }

    /// An unset flag means draft. This is the only place a missing `view_mode` gets a value.
    #[must_use]
    pub const fn from_flag(view_mode: Option<bool>) -> Self {
        match view_mode {
            Some(true) => Self::Published,
            Some(false) | None => Self::Unpublished,
        }
    }

    #[must_use]
    pub const fn root(self) -> &'static str {
        match self {
            Self::Unpublished => UNPUBLISHED_ROOT,
            Self::Published => PUBLISHED_ROOT,
        }
    }

    #[must_use]
    pub fn field(self, field: ViewField) -> FieldPath {
        field.under(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_maps_flag_to_namespace() {
        assert_eq!(ViewNamespace::select(true), ViewNamespace::Published);
        assert_eq!(ViewNamespace::select(false), ViewNamespace::Unpublished);
    }

    #[test]
    fn unset_flag_defaults_to_draft() {
        assert_eq!(ViewNamespace::from_flag(None), ViewNamespace::Unpublished);
        assert_eq!(ViewNamespace::from_flag(Some(false)), ViewNamespace::Unpublished);
        assert_eq!(ViewNamespace::from_flag(Some(true)), ViewNamespace::Published);
    }

    #[test]
    fn field_paths_stay_inside_their_namespace() {
        let p = ViewNamespace::Published.field(ViewField::PageId);
        let u = ViewNamespace::Unpublished.field(ViewField::PageId);
        assert_eq!(p.as_str(), "publishedAction.pageId");
        assert_eq!(u.as_str(), "unpublishedAction.pageId");
    }
}
