//! Associations between models
//!
//! Models declare associations explicitly; the registry resolves them once
//! per class and the resolver runs them against a loaded row.

pub mod definition;
pub mod merge;
pub mod registry;
pub mod resolver;

pub use definition::{
    AssociationDeclaration, AssociationDefinition, AssociationKind, AssociationTarget,
};
pub use merge::{deep_merge, AssociationOverride};
pub use registry::{AssociationRegistry, ModelClass};
pub use resolver::Related;
