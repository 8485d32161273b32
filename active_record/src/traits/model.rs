use crate::association::AssociationDeclaration;
use crate::table_metadata::TableMetadata;
use hook_system::HookSet;
use std::any::{type_name, TypeId};
use std::fmt;

/// Connection alias used by models that don't name one
pub const DEFAULT_CONNECTION: &str = "default";

/// A type that maps to one table.
///
/// Implementations are plain declarations; nothing is instantiated from the
/// implementing type itself. Metadata is read once per process by the
/// [`AssociationRegistry`](crate::association::AssociationRegistry).
///
/// ```
/// use active_record::prelude::*;
///
/// struct User;
/// struct Post;
///
/// impl Model for User {
///     fn table() -> TableMetadata {
///         TableMetadata::new("users", "id").stamp_on_insert("created_at")
///     }
///
///     fn associations() -> Vec<AssociationDeclaration> {
///         vec![AssociationDeclaration::new::<Post>("posts").foreign_key("user_id")]
///     }
/// }
///
/// impl Model for Post {
///     fn table() -> TableMetadata {
///         TableMetadata::new("posts", "id")
///     }
/// }
/// ```
pub trait Model: 'static {
    fn table() -> TableMetadata;

    fn associations() -> Vec<AssociationDeclaration> {
        Vec::new()
    }

    /// Hooks every instance of this model starts with
    fn hooks() -> HookSet {
        HookSet::new()
    }

    /// Connection alias this model executes on
    fn connection() -> &'static str {
        DEFAULT_CONNECTION
    }
}

/// Identity of a model type
#[derive(Clone, Copy)]
pub struct ModelKey {
    type_id: TypeId,
    name: &'static str,
}

impl ModelKey {
    pub fn of<M: Model>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// Rust type name, for messages only
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ModelKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ModelKey {}

impl std::hash::Hash for ModelKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
