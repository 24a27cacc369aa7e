//! CrudService: generic CRUD using the schema registry and safe SQL builder.

mod crud;
pub mod validation;
pub use crud::{CrudOutcome, CrudRequest, CrudService, RawField};
pub use validation::{validate, Coerced, FieldKind, FieldSpec};
