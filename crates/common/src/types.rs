//! Common data types for help desk components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a student, assigned once at startup.
///
/// Identities are dense: a run with `n` students uses ids `0..n`, which lets
/// per-student tables be plain vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(pub u32);

impl StudentId {
    /// Position of this student in a dense per-student table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a tutor, assigned once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TutorId(pub u32);

impl fmt::Display for TutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_as_bare_numbers() {
        assert_eq!(StudentId(7).to_string(), "7");
        assert_eq!(TutorId(0).to_string(), "0");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&StudentId(42)).unwrap();
        assert_eq!(json, "42");

        let tutor: TutorId = serde_json::from_str("3").unwrap();
        assert_eq!(tutor, TutorId(3));
    }

    #[test]
    fn test_index_matches_raw_value() {
        assert_eq!(StudentId(5).index(), 5);
    }
}
