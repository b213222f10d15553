use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::store::model_file::ModelRecord;

/// Name of the append-only list of saved models.
pub const INDEX_FILE: &str = "PerceptronIndex";
pub const MODEL_EXTENSION: &str = "model";

/// A directory of saved models plus an index of the names in use.
///
/// The index is only ever appended to, and only by [`ModelStore::save`];
/// listing and loading never touch the filesystem beyond reading.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<ModelStore> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        debug!("opened model store at {}", root.display());
        Ok(ModelStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, MODEL_EXTENSION))
    }

    /// Path of an existing model file. Stores written by older versions keep
    /// each model under its bare name, so that is tried when `<name>.model`
    /// is missing.
    fn existing_model_path(&self, name: &str) -> PathBuf {
        let path = self.model_path(name);
        if path.exists() {
            return path;
        }
        let legacy = self.root.join(name);
        if legacy.is_file() {
            debug!("reading '{}' from legacy path {}", name, legacy.display());
            return legacy;
        }
        path
    }

    /// Names in the index, in the order they were saved. A store that has
    /// never been saved to is empty.
    pub fn list(&self) -> Result<Vec<String>> {
        let path = self.index_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&path, e)),
        };
        let mut names = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let name = line.trim();
            if name.is_empty() {
                if !line.is_empty() {
                    warn!("{}: line {} is whitespace only", path.display(), i + 1);
                }
                continue;
            }
            names.push(name.to_owned());
        }
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|existing| existing == name))
    }

    /// Saves a model under `record.name`.
    ///
    /// Fails with [`Error::DuplicateName`] if the name is already indexed or a
    /// model file with that name already exists; nothing is written then.
    pub fn save(&self, record: &ModelRecord) -> Result<()> {
        let name = record.name.as_str();
        validate_name(name)?;
        if self.contains(name)? {
            return Err(Error::DuplicateName(name.to_owned()));
        }

        let model_path = self.model_path(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&model_path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::DuplicateName(name.to_owned()))
            }
            Err(e) => return Err(Error::io(&model_path, e)),
        };
        let written = file
            .write_all(record.to_text().as_bytes())
            .and_then(|_| file.sync_all());
        if let Err(e) = written {
            discard(&model_path);
            return Err(Error::io(&model_path, e));
        }

        let index_path = self.index_path();
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&index_path)
            .and_then(|mut index| writeln!(index, "{}", name));
        if let Err(e) = appended {
            discard(&model_path);
            return Err(Error::io(&index_path, e));
        }

        info!("saved model '{}' to {}", name, model_path.display());
        Ok(())
    }

    /// Loads a model by name. Fails with [`Error::NotFound`] when the name is
    /// not in the index.
    pub fn load(&self, name: &str) -> Result<ModelRecord> {
        validate_name(name)?;
        if !self.contains(name)? {
            return Err(Error::NotFound(name.to_owned()));
        }
        let path = self.existing_model_path(name);
        let text = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        debug!("read {} bytes from {}", text.len(), path.display());
        ModelRecord::parse(name, &text)
    }
}

/// Removes a model file whose save did not complete. An unindexed file would
/// otherwise block its name for good.
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("could not remove {}: {}", path.display(), e);
    }
}

/// Names double as file stems and index lines.
fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name != name.trim()
        || name == "."
        || name == INDEX_FILE
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.chars().any(char::is_control);
    if bad {
        return Err(Error::InvalidName(name.to_owned()));
    }
    Ok(())
}
