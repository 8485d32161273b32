//! Hook kinds and failures

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Persistence operation a hook is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Insert => "insert",
            HookKind::Update => "update",
            HookKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A hook rejected or failed to transform the data
#[derive(Debug, Error)]
#[error("{kind} hook failed: {source}")]
pub struct HookError {
    pub kind: HookKind,
    #[source]
    pub source: anyhow::Error,
}

impl HookError {
    pub fn new(kind: HookKind, source: anyhow::Error) -> Self {
        Self { kind, source }
    }
}
