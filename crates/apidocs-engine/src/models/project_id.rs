use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid project id '{0}': must be non-empty and free of path separators")]
pub struct InvalidProjectId(pub String);

/// Key of a project's snapshot history
///
/// Restricted so it can name a directory in a filesystem store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidProjectId> {
        let id = id.into();
        let valid = !id.trim().is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\', '\0']);
        if valid { Ok(Self(id)) } else { Err(InvalidProjectId(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectId {
    type Error = InvalidProjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectId> for String {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("petstore")]
    #[case("petstore-v2.1")]
    #[case("My Project")]
    fn test_valid_ids(#[case] id: &str) {
        assert_eq!(ProjectId::new(id).unwrap().as_str(), id);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("..")]
    #[case("a/b")]
    #[case("a\\b")]
    fn test_invalid_ids(#[case] id: &str) {
        assert_eq!(ProjectId::new(id), Err(InvalidProjectId(id.to_string())));
    }
}
