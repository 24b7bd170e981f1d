//! Collection operations and request validation, independent of HTTP.

mod crud;
mod validation;
pub use crud::{is_visible, CrudService};
pub use validation::RequestValidator;
