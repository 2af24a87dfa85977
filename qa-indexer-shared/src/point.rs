//! Vector point identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a point in the vector engine.
///
/// Points written by the loader are always numeric; the UUID form exists
/// because scroll cursors returned by the engine may use either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        Self::Num(id)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(id) => write!(f, "{}", id),
            Self::Uuid(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_forms() {
        let num: PointId = serde_json::from_str("17").unwrap();
        assert_eq!(num, PointId::Num(17));

        let uuid: PointId =
            serde_json::from_str("\"5c56c793-69f3-4fbf-87e6-c4bf54c28c26\"").unwrap();
        assert!(matches!(uuid, PointId::Uuid(_)));
        assert_eq!(serde_json::to_string(&PointId::Num(3)).unwrap(), "3");
    }
}
