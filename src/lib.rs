pub mod acl;
pub mod action;
pub mod config;
pub mod criteria;
pub mod document;
pub mod errors;
pub mod query;
pub mod repository;
pub mod schema;
pub mod store;
pub mod types;
pub mod utils;
pub mod view;

pub use acl::{AclPermission, PermissionEvaluator, PermissionToken, PolicyEvaluator, Principal};
pub use action::{Action, ActionConfiguration, ActionView, Policy};
pub use config::RepositoryConfig;
pub use criteria::{Clause, Criteria};
pub use errors::{ActionError, ErrorKind, StoreError};
pub use repository::{ActionCursor, ActionRepository};
pub use schema::{ActionField, FieldPath, ViewField};
pub use store::{DocumentStore, MemoryStore};
pub use view::ViewNamespace;

/// Repository over the in-process store with policy-based authorization.
pub type MemoryActionRepository = ActionRepository<MemoryStore, PolicyEvaluator>;

/// Initializes logging from `ACTIONLITE_*` environment variables.
///
/// Call once at process start; later calls fail because a logger is already installed.
///
/// # Errors
/// Returns an error if the log directory or files cannot be created.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    utils::logger::configure_from_env()
}
