//! Utility modules: developer traces and logger setup.
pub mod devlog;
pub mod logger;
