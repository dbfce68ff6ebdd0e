//! JSON output artifact with backup-before-write and atomic replace.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use super::StoreError;
use crate::publication::Publication;

/// Result of a successful [`JsonStore::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Copy of the previous artifact, if one existed.
    pub backup: Option<PathBuf>,
    /// Number of records written.
    pub written: usize,
}

/// The publication list on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and parses the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read and
    /// [`StoreError::Parse`] if it is not a publication list.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Vec<Publication>, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        let publications: Vec<Publication> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        debug!(count = publications.len(), "loaded artifact");
        Ok(publications)
    }

    /// Backs up any existing artifact, then atomically replaces it.
    ///
    /// The new content goes to a temporary file in the same directory and is
    /// renamed over the artifact, so a failed write leaves the previous file
    /// intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on any filesystem or serialization failure.
    #[instrument(skip(self, publications), fields(path = %self.path.display(), count = publications.len()))]
    pub fn persist(&self, publications: &[Publication]) -> Result<PersistOutcome, StoreError> {
        let dir = self.ensure_parent()?;
        let backup = self.backup()?;

        let mut body = serde_json::to_string_pretty(publications).map_err(StoreError::Serialize)?;
        body.push('\n');
        self.replace(&dir, body.as_bytes())?;

        info!(written = publications.len(), "artifact written");
        Ok(PersistOutcome {
            backup,
            written: publications.len(),
        })
    }

    /// Writes an empty list when no artifact exists yet. Never touches an
    /// existing file.
    ///
    /// Returns `true` if a file was created.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the empty artifact cannot be written.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn bootstrap_if_missing(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            debug!("artifact present, leaving it untouched");
            return Ok(false);
        }
        let dir = self.ensure_parent()?;
        self.replace(&dir, b"[]\n")?;
        info!("created empty artifact");
        Ok(true)
    }

    /// Copies the current artifact to `<stem>.backup.<unix_millis>.json` next
    /// to it. Returns `None` when there is nothing to back up.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the copy fails.
    pub fn backup(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.exists() {
            return Ok(None);
        }

        let mut millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis());
        let mut target = self.backup_path(millis);
        while target.exists() {
            millis += 1;
            target = self.backup_path(millis);
        }

        fs::copy(&self.path, &target).map_err(|source| StoreError::Io {
            path: target.clone(),
            source,
        })?;
        info!(backup = %target.display(), "backed up previous artifact");
        Ok(Some(target))
    }

    fn backup_path(&self, millis: u128) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map_or_else(|| "publications".into(), |s| s.to_string_lossy());
        self.path.with_file_name(format!("{stem}.backup.{millis}.json"))
    }

    fn ensure_parent(&self) -> Result<PathBuf, StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        match fs::create_dir_all(&dir) {
            Ok(()) => Ok(dir),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(dir),
            Err(source) => Err(StoreError::Io { path: dir, source }),
        }
    }

    fn replace(&self, dir: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let io = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(io)?;
        temp.write_all(bytes).map_err(io)?;
        temp.as_file().sync_all().map_err(io)?;
        temp.persist(&self.path).map_err(|err| io(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(title: &str, year: &str) -> Publication {
        Publication {
            year: year.to_string(),
            ..Publication::titled(title)
        }
    }

    fn backups(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .unwrap()
                    .to_string_lossy()
                    .contains(".backup.")
            })
            .collect();
        found.sort();
        found
    }

    #[test]
    fn test_persist_creates_parent_and_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("data/publications.json"));

        let outcome = store.persist(&[sample("A", "2024")]).unwrap();
        assert_eq!(outcome.written, 1);
        assert!(outcome.backup.is_none());

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"title\": \"A\""));
        assert!(text.ends_with("]\n"));
        assert_eq!(store.load().unwrap(), vec![sample("A", "2024")]);
    }

    #[test]
    fn test_persist_backs_up_previous_artifact() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("publications.json"));
        store.persist(&[sample("Old", "2020")]).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let outcome = store.persist(&[sample("New", "2024")]).unwrap();
        let backup = outcome.backup.unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), before);
        assert!(
            backup
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("publications.backup.")
        );
        assert_eq!(store.load().unwrap()[0].title, "New");
    }

    #[test]
    fn test_repeated_backups_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("publications.json"));
        store.persist(&[]).unwrap();
        store.persist(&[]).unwrap();
        store.persist(&[]).unwrap();
        assert_eq!(backups(dir.path()).len(), 2);
    }

    #[test]
    fn test_persist_is_byte_identical_for_same_input() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("publications.json"));
        let records = vec![sample("A", "2024"), sample("B", "N/A")];

        store.persist(&records).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.persist(&records).unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), first);
    }

    #[test]
    fn test_bootstrap_only_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("publications.json"));

        assert!(store.bootstrap_if_missing().unwrap());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]\n");

        store.persist(&[sample("Keep", "2021")]).unwrap();
        assert!(!store.bootstrap_if_missing().unwrap());
        assert_eq!(store.load().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_replace_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("publications.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "kept").unwrap();

        let err = JsonStore::new(&target)
            .persist(&[sample("New", "2024")])
            .unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "kept");
        // The temporary file is cleaned up with the failed rename.
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_keeps_previous_artifact() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let store = JsonStore::new(data.join("publications.json"));
        store.persist(&[sample("Old", "2020")]).unwrap();
        let before = fs::read(store.path()).unwrap();

        fs::set_permissions(&data, fs::Permissions::from_mode(0o555)).unwrap();
        if fs::File::create(data.join(".writable")).is_ok() {
            // Running with privileges that ignore directory permissions.
            fs::set_permissions(&data, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = store.persist(&[sample("New", "2024")]);
        fs::set_permissions(&data, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(StoreError::Io { .. })));
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap()[0].title, "Old");
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("publications.json");
        fs::write(&path, "{\"not\": \"a list\"}").unwrap();
        let err = JsonStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = JsonStore::new(dir.path().join("absent.json"))
            .load()
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
