use crate::ProtoCmpError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Sequence of field names locating a (possibly nested) field from the
/// message root. List positions and map keys are not path segments: the
/// path of `bars[2].size` is `bars.size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path, denoting the root message itself.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path such as `bars.size`. Empty input and empty
    /// segments are rejected.
    pub fn parse(dotted: &str) -> Result<Self, ProtoCmpError> {
        if dotted.is_empty() {
            return Err(ProtoCmpError::InvalidPath("empty path".to_string()));
        }
        let mut segments = Vec::new();
        for segment in dotted.split('.') {
            if segment.is_empty() {
                return Err(ProtoCmpError::InvalidPath(format!(
                    "empty segment in `{dotted}`"
                )));
            }
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    /// The path one level down, at field `segment`.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True iff `prefix` equals this path or is a proper prefix of it.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        prefix.0.len() <= self.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// True iff `path` or any of its ancestors appears in `ignore`.
pub fn is_ignored(path: &FieldPath, ignore: &HashSet<FieldPath>) -> bool {
    ignore.iter().any(|prefix| path.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let path = FieldPath::parse("bars.size").unwrap();
        assert_eq!(path.segments(), ["bars", "size"]);
        assert_eq!(path.to_string(), "bars.size");
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("bars..size").is_err());
        assert!(FieldPath::parse(".bars").is_err());
    }

    #[test]
    fn child_extends_path() {
        let path = FieldPath::root().child("bars").child("size");
        assert_eq!(path, FieldPath::new(["bars", "size"]));
    }

    #[test]
    fn prefix_semantics() {
        let ignore: HashSet<FieldPath> = [FieldPath::new(["a"])].into_iter().collect();

        assert!(is_ignored(&FieldPath::new(["a"]), &ignore));
        assert!(is_ignored(&FieldPath::new(["a", "b"]), &ignore));
        assert!(is_ignored(&FieldPath::new(["a", "b", "c"]), &ignore));
        assert!(!is_ignored(&FieldPath::new(["ab"]), &ignore));
        assert!(!is_ignored(&FieldPath::new(["b", "a"]), &ignore));
        assert!(!is_ignored(&FieldPath::root(), &ignore));
    }

    #[test]
    fn exact_match_is_ignored() {
        let ignore: HashSet<FieldPath> =
            [FieldPath::new(["bars", "size"])].into_iter().collect();

        assert!(is_ignored(&FieldPath::new(["bars", "size"]), &ignore));
        assert!(!is_ignored(&FieldPath::new(["bars"]), &ignore));
        assert!(!is_ignored(&FieldPath::new(["bars", "name"]), &ignore));
    }
}
