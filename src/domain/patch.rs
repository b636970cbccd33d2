//! Tri-state field updates for partial `PATCH` semantics.
//!
//! A [`Patch`] distinguishes a field the caller left out from a field the
//! caller explicitly set. Combined with `Option<T>` it also distinguishes
//! "set to null" from "not mentioned":
//!
//! | JSON body          | `Patch<Option<String>>`     |
//! |--------------------|-----------------------------|
//! | `{}`               | `Patch::Absent`             |
//! | `{"notes": null}`  | `Patch::Set(None)`          |
//! | `{"notes": "hi"}`  | `Patch::Set(Some("hi"))`    |
//!
//! Struct fields must carry `#[serde(default)]` so a missing key falls back
//! to [`Patch::Absent`].

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// Returns the provided value, or `current` when the field was absent.
    pub fn apply(self, current: T) -> T {
        match self {
            Patch::Set(value) => value,
            Patch::Absent => current,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Set(value) => Patch::Set(f(value)),
            Patch::Absent => Patch::Absent,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct NotesPatch {
        #[serde(default)]
        notes: Patch<Option<String>>,
        #[serde(default)]
        visited: Patch<bool>,
    }

    #[test]
    fn missing_field_is_absent() {
        let patch: NotesPatch = serde_json::from_str("{}").expect("parse");
        assert!(patch.notes.is_absent());
        assert!(patch.visited.is_absent());
    }

    #[test]
    fn explicit_null_is_set_to_none() {
        let patch: NotesPatch = serde_json::from_str(r#"{"notes": null}"#).expect("parse");
        assert_eq!(patch.notes, Patch::Set(None));
        assert!(patch.visited.is_absent());
    }

    #[test]
    fn explicit_value_is_set() {
        let patch: NotesPatch =
            serde_json::from_str(r#"{"notes": "bring tickets", "visited": false}"#)
                .expect("parse");
        assert_eq!(patch.notes, Patch::Set(Some("bring tickets".to_string())));
        assert_eq!(patch.visited, Patch::Set(false));
    }

    #[test]
    fn null_for_non_optional_field_is_rejected() {
        let result = serde_json::from_str::<NotesPatch>(r#"{"visited": null}"#);
        assert!(result.is_err());
    }

    #[test]
    fn apply_keeps_current_when_absent() {
        assert_eq!(Patch::<i32>::Absent.apply(7), 7);
        assert_eq!(Patch::Set(3).apply(7), 3);
    }
}
