//! Traits for model declarations and fluent condition building

pub mod filterable;
pub mod model;

pub use filterable::Filterable;
pub use model::{Model, ModelKey, DEFAULT_CONNECTION};
