use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::InvoiceRecord;

const INVOICE_DIR: &str = "invoices";

/// Read-only view over `<root>/invoices/<id>.toml` / `<id>.json`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(INVOICE_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads one record. TOML wins when both formats exist.
    pub fn load(&self, id: &str) -> Result<InvoiceRecord> {
        validate_id(id)?;

        let toml_path = self.dir.join(format!("{id}.toml"));
        if toml_path.is_file() {
            debug!(path = %toml_path.display(), "loading invoice record");
            let content = fs::read_to_string(&toml_path)?;
            return Ok(toml::from_str(&content)?);
        }

        let json_path = self.dir.join(format!("{id}.json"));
        if json_path.is_file() {
            debug!(path = %json_path.display(), "loading invoice record");
            let content = fs::read_to_string(&json_path)?;
            return Ok(serde_json::from_str(&content)?);
        }

        Err(Error::NotFound(id.to_string()))
    }

    /// All stored invoice ids, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(dir = %self.dir.display(), "invoice directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut ids = BTreeSet::new();
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(
                        dir = %self.dir.display(),
                        "skipping unreadable directory entry: {e}"
                    );
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let is_record = path
                .extension()
                .is_some_and(|ext| ext == "toml" || ext == "json");
            if !is_record {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.insert(stem.to_string());
            }
        }
        Ok(ids.into_iter().collect())
    }
}

fn validate_id(id: &str) -> Result<()> {
    let bad = id.is_empty()
        || id.contains("..")
        || id.contains('/')
        || id.contains('\\')
        || Path::new(id).is_absolute();
    if bad {
        return Err(Error::InvalidId(id.to_string()));
    }
    Ok(())
}
