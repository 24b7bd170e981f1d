//! HTTP handlers for collection routes.

pub mod collection;
pub use collection::*;
