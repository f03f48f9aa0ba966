//! Identity of the user performing an action.
use serde::{Deserialize, Serialize};

/// Opaque identity handed to every operation by the caller.
///
/// The core never looks anything up from it beyond comparing `id`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// Same user, regardless of the display name currently attached
    pub fn is(&self, other: &UserIdentity) -> bool {
        self.id == other.id
    }
}
