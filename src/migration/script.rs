//! Migration script directory
//!
//! One sub-directory per revision, named `<rev-id>_<slug>`, holding
//! `up.sql` and `down.sql`. This is the layout `diesel_migrations` reads,
//! so the same directory drives both the listing commands here and the
//! diesel migration harness.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::BackendError;

/// Up script file name inside a revision directory
pub const UP_SQL: &str = "up.sql";

/// Down script file name inside a revision directory
pub const DOWN_SQL: &str = "down.sql";

/// Slug used when a revision is created without a message
const DEFAULT_SLUG: &str = "revision";

static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern"));

/// A single migration script on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    /// Revision id as written in the directory name, e.g. `2024-05-01-120000`
    pub id: String,
    /// Descriptive part of the directory name
    pub slug: String,
    /// Path of the revision directory
    pub path: PathBuf,
}

impl Revision {
    /// Version key stored in the database version table
    ///
    /// diesel strips dashes from the leading component of the directory name.
    pub fn version(&self) -> String {
        self.id.replace('-', "")
    }

    pub fn up_path(&self) -> PathBuf {
        self.path.join(UP_SQL)
    }

    pub fn down_path(&self) -> PathBuf {
        self.path.join(DOWN_SQL)
    }

    pub fn up_sql(&self) -> Result<String, BackendError> {
        read_script(&self.up_path())
    }

    pub fn down_sql(&self) -> Result<String, BackendError> {
        read_script(&self.down_path())
    }

    /// `<id> (<slug>)` used in listings
    pub fn label(&self) -> String {
        format!("{} ({})", self.id, self.slug)
    }

    fn from_dir(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        if name.starts_with('.') || !path.join(UP_SQL).is_file() {
            return None;
        }
        let (id, slug) = match name.split_once('_') {
            Some((id, slug)) => (id.to_string(), slug.to_string()),
            None => (name.clone(), String::new()),
        };
        if id.is_empty() {
            return None;
        }
        Some(Self { id, slug, path })
    }
}

fn read_script(path: &Path) -> Result<String, BackendError> {
    fs::read_to_string(path).map_err(|e| BackendError::io(path, e))
}

/// Turn a revision message into a directory slug
pub fn slugify(message: Option<&str>) -> String {
    let lowered = message.unwrap_or_default().to_lowercase();
    let slug = SLUG_SEPARATORS.replace_all(&lowered, "_");
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug.chars().take(64).collect::<String>().trim_end_matches('_').to_string()
    }
}

/// Default revision id: current UTC time as `YYYY-MM-DD-HHMMSS`
pub fn timestamp_revision_id() -> String {
    jiff::Timestamp::now().strftime("%Y-%m-%d-%H%M%S").to_string()
}

/// The directory holding every revision of the project
#[derive(Debug, Clone)]
pub struct ScriptDirectory {
    root: PathBuf,
}

impl ScriptDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Create the script directory
    ///
    /// # Errors
    /// Fails if the directory already exists and holds any entry.
    pub fn init(&self) -> Result<(), BackendError> {
        if self.root.exists() {
            let mut entries = fs::read_dir(&self.root).map_err(|e| BackendError::io(&self.root, e))?;
            if entries.next().is_some() {
                return Err(BackendError::DirectoryNotEmpty {
                    path: self.root.clone(),
                });
            }
        }

        fs::create_dir_all(&self.root).map_err(|e| BackendError::io(&self.root, e))?;
        let keep = self.root.join(".keep");
        fs::write(&keep, "").map_err(|e| BackendError::io(&keep, e))?;
        Ok(())
    }

    /// All revisions, oldest first
    pub fn revisions(&self) -> Result<Vec<Revision>, BackendError> {
        if !self.exists() {
            return Err(BackendError::ScriptDirectoryMissing {
                path: self.root.clone(),
            });
        }

        let entries = fs::read_dir(&self.root).map_err(|e| BackendError::io(&self.root, e))?;
        let mut revisions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BackendError::io(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(revision) = Revision::from_dir(entry.path()) {
                revisions.push(revision);
            }
        }

        revisions.sort_by(|a, b| a.version().cmp(&b.version()).then_with(|| a.id.cmp(&b.id)));
        Ok(revisions)
    }

    /// The newest revision, if any
    pub fn head(&self) -> Result<Option<Revision>, BackendError> {
        Ok(self.revisions()?.pop())
    }

    /// Write a new revision with empty up/down scripts
    ///
    /// `rev_id` defaults to [`timestamp_revision_id`].
    pub fn create_revision(
        &self,
        message: Option<&str>,
        rev_id: Option<&str>,
    ) -> Result<Revision, BackendError> {
        let existing = self.revisions()?;
        let id = rev_id.map(str::to_string).unwrap_or_else(timestamp_revision_id);
        let version = id.replace('-', "");
        if existing.iter().any(|r| r.version() == version) {
            return Err(BackendError::DuplicateRevision { id });
        }

        let slug = slugify(message);
        let path = self.root.join(format!("{}_{}", id, slug));
        fs::create_dir(&path).map_err(|e| BackendError::io(&path, e))?;

        let title = message.unwrap_or("empty message");
        let revision = Revision { id, slug, path };
        write_stub(&revision.up_path(), &revision, title, "apply")?;
        write_stub(&revision.down_path(), &revision, title, "revert")?;
        Ok(revision)
    }
}

fn write_stub(path: &Path, revision: &Revision, title: &str, action: &str) -> Result<(), BackendError> {
    let created = jiff::Timestamp::now().strftime("%Y-%m-%d %H:%M:%S UTC");
    let body = format!(
        "-- {}\n--\n-- Revision: {}\n-- Created: {}\n--\n-- SQL to {} this revision.\n",
        title, revision.id, created, action
    );
    fs::write(path, body).map_err(|e| BackendError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_revision(root: &Path, name: &str) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(UP_SQL), "SELECT 1;").unwrap();
        fs::write(dir.join(DOWN_SQL), "SELECT 0;").unwrap();
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify(Some("Add users table")), "add_users_table");
        assert_eq!(slugify(Some("  --Rename: a/b  ")), "rename_a_b");
        assert_eq!(slugify(Some("!!!")), "revision");
        assert_eq!(slugify(None), "revision");
    }

    #[test]
    fn test_timestamp_revision_id_shape() {
        let id = timestamp_revision_id();
        assert_eq!(id.len(), "2024-01-01-000000".len());
        assert_eq!(id.matches('-').count(), 3);
    }

    #[test]
    fn test_init_creates_directory() {
        let temp = TempDir::new().unwrap();
        let scripts = ScriptDirectory::new(temp.path().join("migrations"));

        scripts.init().unwrap();
        assert!(scripts.exists());
        assert!(scripts.revisions().unwrap().is_empty());
    }

    #[test]
    fn test_init_rejects_non_empty_directory() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("something.txt"), "x").unwrap();

        let err = ScriptDirectory::new(temp.path()).init().unwrap_err();
        assert!(matches!(err, BackendError::DirectoryNotEmpty { .. }));
    }

    #[test]
    fn test_revisions_are_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        write_revision(temp.path(), "2024-03-01-000000_third");
        write_revision(temp.path(), "2024-01-01-000000_first");
        write_revision(temp.path(), "2024-02-01-000000_second");
        fs::create_dir_all(temp.path().join("2024-04-01-000000_no_up_script")).unwrap();
        fs::write(temp.path().join("README"), "not a revision").unwrap();

        let scripts = ScriptDirectory::new(temp.path());
        let ids: Vec<String> = scripts.revisions().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(
            ids,
            vec!["2024-01-01-000000", "2024-02-01-000000", "2024-03-01-000000"]
        );
        assert_eq!(scripts.head().unwrap().unwrap().slug, "third");
    }

    #[test]
    fn test_missing_directory_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = ScriptDirectory::new(temp.path().join("nope")).revisions().unwrap_err();
        assert!(err.to_string().contains("init"));
    }

    #[test]
    fn test_create_revision_writes_scripts() {
        let temp = TempDir::new().unwrap();
        let scripts = ScriptDirectory::new(temp.path());

        let revision = scripts
            .create_revision(Some("Create accounts"), Some("abc123"))
            .unwrap();
        assert_eq!(revision.id, "abc123");
        assert_eq!(revision.slug, "create_accounts");
        assert!(revision.path.ends_with("abc123_create_accounts"));
        assert!(revision.up_sql().unwrap().contains("Create accounts"));
        assert!(revision.down_sql().unwrap().contains("revert"));
        assert_eq!(scripts.revisions().unwrap(), vec![revision]);
    }

    #[test]
    fn test_create_revision_rejects_duplicate_id() {
        let temp = TempDir::new().unwrap();
        let scripts = ScriptDirectory::new(temp.path());
        scripts.create_revision(None, Some("abc123")).unwrap();

        let err = scripts.create_revision(Some("again"), Some("abc123")).unwrap_err();
        assert!(matches!(err, BackendError::DuplicateRevision { .. }));
    }

    #[test]
    fn test_revision_version_strips_dashes() {
        let revision = Revision {
            id: "2024-05-01-120000".to_string(),
            slug: "x".to_string(),
            path: PathBuf::from("2024-05-01-120000_x"),
        };
        assert_eq!(revision.version(), "20240501120000");
        assert_eq!(revision.label(), "2024-05-01-120000 (x)");
    }
}
