//! Local document store laid out like the invoice bucket (`client/project/file`).

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use tracing::debug;

use factura_core::models::config::StorageConfig;
use factura_core::BatchKey;

/// One document found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Path relative to the store root, `/`-separated.
    pub name: String,
    /// Absolute or root-joined path on disk.
    pub path: PathBuf,
}

impl StoredDocument {
    pub fn key(&self) -> BatchKey {
        BatchKey::from_path(&self.name)
    }

    /// Whether the document sits inside at least one folder.
    pub fn is_grouped(&self) -> bool {
        self.name.contains('/')
    }
}

pub struct LocalStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root, &config.extensions)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file with an accepted extension, sorted by name.
    pub fn list(&self) -> anyhow::Result<Vec<StoredDocument>> {
        if !self.root.is_dir() {
            anyhow::bail!("Document store not found: {}", self.root.display());
        }

        let pattern = format!(
            "{}/**/*",
            Pattern::escape(&self.root.to_string_lossy())
        );

        let mut documents: Vec<StoredDocument> = glob(&pattern)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file() && self.accepts(p))
            .filter_map(|p| {
                let relative = p.strip_prefix(&self.root).ok()?;
                let name = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                Some(StoredDocument { name, path: p })
            })
            .collect();

        documents.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Found {} documents under {}", documents.len(), self.root.display());
        Ok(documents)
    }

    /// Clients and their projects, from documents inside a client folder.
    pub fn clients(&self) -> anyhow::Result<BTreeMap<String, BTreeSet<String>>> {
        let mut clients: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for document in self.list()?.iter().filter(|d| d.is_grouped()) {
            let key = document.key();
            clients.entry(key.client).or_default().insert(key.project);
        }
        Ok(clients)
    }

    fn accepts(&self, path: &Path) -> bool {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.extensions.iter().any(|e| *e == extension)
    }
}
