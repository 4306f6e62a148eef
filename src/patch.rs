//! Three-state field updates for partial modifications.

use serde::{Deserialize, Serialize};

/// Update instruction for an optional field.
///
/// `Unchanged` leaves the current value alone, `Clear` removes it, and `Set`
/// replaces it. This keeps "field absent from the patch" distinct from
/// "field explicitly cleared".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FieldUpdate<T> {
    /// Keep the current value.
    Unchanged,
    /// Remove the current value.
    Clear,
    /// Replace the current value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Applies the update to `current`, returning the resulting value.
    #[must_use]
    pub fn apply_to(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unchanged => current,
            Self::Clear => None,
            Self::Set(value) => Some(value),
        }
    }
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}
