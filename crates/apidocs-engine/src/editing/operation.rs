use std::fmt;

/// A single structured edit requested by the chat channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    Update { filename: String, content: String },
    Add { filename: String, content: String },
    Delete { filename: String },
}

impl EditOperation {
    pub fn update(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Update {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn add(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Add {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn delete(filename: impl Into<String>) -> Self {
        Self::Delete {
            filename: filename.into(),
        }
    }

    /// The document this operation targets
    pub fn filename(&self) -> &str {
        match self {
            Self::Update { filename, .. } | Self::Add { filename, .. } | Self::Delete { filename } => {
                filename
            }
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Update { .. } => OperationKind::Update,
            Self::Add { .. } => OperationKind::Add,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Update,
    Add,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Update => "update",
            Self::Add => "add",
            Self::Delete => "delete",
        })
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.filename())
    }
}
