//! Property read model.
//!
//! Listing CRUD lives outside the core; this module only reads the fields
//! the coordination core needs (owner for settlement, title for
//! availability snapshots).

mod properties_model;
mod properties_repository;

pub use properties_model::Property;
pub use properties_repository::PropertyRepository;
