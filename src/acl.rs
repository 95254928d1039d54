//! Permission evaluation.
//!
//! The executor treats a permission token as opaque: it asks a [`PermissionEvaluator`] for a
//! predicate and ANDs that into the query. [`PolicyEvaluator`] is the evaluator for documents
//! carrying a `policies` array.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::ActionError;
use crate::query::Filter;
use crate::schema::ActionField;

/// Turns a caller's token into the predicate restricting results to what it may see.
pub trait PermissionEvaluator: Send + Sync {
    type Token: Send + Sync;

    /// # Errors
    /// Returns `ActionError::Authorization` when no predicate can be resolved for the token.
    /// Implementations must not fall back to granting or denying everything.
    fn auth_predicate(&self, token: &Self::Token) -> Result<Filter, ActionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AclPermission {
    ReadActions,
    ExecuteActions,
    ManageActions,
}

impl AclPermission {
    /// Name stored in `policies[].permission`.
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::ReadActions => "read:actions",
            Self::ExecuteActions => "execute:actions",
            Self::ManageActions => "manage:actions",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub username: Option<String>,
    pub groups: BTreeSet<String>,
}

impl Principal {
    #[must_use]
    pub fn user(username: &str) -> Self {
        Self { username: Some(username.to_string()), groups: BTreeSet::new() }
    }

    #[must_use]
    pub fn in_group(mut self, group: &str) -> Self {
        self.groups.insert(group.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Grant { permission: AclPermission, principal: Principal },
    Deny,
}

/// Capability presented with every query. Only [`PolicyEvaluator`] looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionToken {
    scope: Scope,
}

impl PermissionToken {
    #[must_use]
    pub const fn new(permission: AclPermission, principal: Principal) -> Self {
        Self { scope: Scope::Grant { permission, principal } }
    }

    /// A token that authorizes nothing.
    #[must_use]
    pub const fn no_access() -> Self {
        Self { scope: Scope::Deny }
    }
}

const PERMISSION: &str = "permission";
const USERS: &str = "users";
const GROUPS: &str = "groups";

/// Resolves tokens against the `policies` array stored on each action.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    anonymous_user: Option<String>,
}

impl PolicyEvaluator {
    #[must_use]
    pub const fn new() -> Self {
        Self { anonymous_user: None }
    }

    /// Policies listing this user are visible to every principal (public actions).
    #[must_use]
    pub fn with_anonymous_user(mut self, username: &str) -> Self {
        self.anonymous_user = Some(username.to_string());
        self
    }
}

impl PermissionEvaluator for PolicyEvaluator {
    type Token = PermissionToken;

    fn auth_predicate(&self, token: &PermissionToken) -> Result<Filter, ActionError> {
        let (permission, principal) = match &token.scope {
            Scope::Deny => return Ok(Filter::none()),
            Scope::Grant { permission, principal } => (permission, principal),
        };
        let username = principal.username.as_deref().filter(|u| !u.is_empty());
        if username.is_none() && principal.groups.is_empty() {
            return Err(ActionError::Authorization(format!(
                "token for `{}` names neither a user nor a group",
                permission.value()
            )));
        }

        let users: BTreeSet<&str> = username.into_iter().chain(self.anonymous_user.as_deref()).collect();
        let policies = ActionField::Policies.path();
        let mut holders = Vec::with_capacity(2);
        if !users.is_empty() {
            holders.push(Filter::In { path: USERS.into(), values: users.into_iter().map(Into::into).collect() });
        }
        if !principal.groups.is_empty() {
            holders.push(Filter::In {
                path: GROUPS.into(),
                values: principal.groups.iter().map(|g| g.as_str().into()).collect(),
            });
        }
        Ok(Filter::ElemMatch {
            path: policies.into_string(),
            filter: Box::new(Filter::And(vec![
                Filter::Cmp { path: PERMISSION.into(), op: crate::query::CmpOp::Eq, value: permission.value().into() },
                Filter::Or(holders),
            ])),
        })
    }
}
