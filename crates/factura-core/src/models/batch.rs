//! Client/project grouping of stored documents.

use serde::{Deserialize, Serialize};

/// Client used when a document sits at the storage root.
pub const DEFAULT_CLIENT: &str = "Desconocido";

/// Project used when a document has no project folder.
pub const DEFAULT_PROJECT: &str = "General";

/// Output routing key derived from a storage path (`client/project/...`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BatchKey {
    pub client: String,
    pub project: String,
}

impl BatchKey {
    pub fn new(client: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            project: project.into(),
        }
    }

    /// Derive the key from the first two folders of a `/`-separated path.
    ///
    /// The last segment is the file itself and never counts as a folder.
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let folders = &segments[..segments.len().saturating_sub(1)];

        let client = folders.first().copied().unwrap_or(DEFAULT_CLIENT);
        let project = folders.get(1).copied().unwrap_or(DEFAULT_PROJECT);
        Self::new(client, project)
    }

    /// Whether this key passes optional client/project filters.
    pub fn matches(&self, client: Option<&str>, project: Option<&str>) -> bool {
        client.is_none_or(|c| c == self.client) && project.is_none_or(|p| p == self.project)
    }

    /// Base name of the output spreadsheet for this group.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.client, self.project)
    }
}

impl std::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.client, self.project)
    }
}
