// Telemetry is a submodule of query
pub mod telemetry;

// Submodules for separation of concerns
mod cursor;
mod eval;
mod types;

// Public API re-exports
pub use cursor::Cursor;
pub use eval::{compare_bson, compare_docs, eval_filter};
#[cfg(test)]
pub(crate) use eval::get_path;
pub use types::{CmpOp, Filter, FindOptions, Order, SortSpec, validate_sort};
