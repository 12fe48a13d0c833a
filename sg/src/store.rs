//! Artifact store
//!
//! Filesystem registry of numbered feature directories:
//!
//! ```text
//! specs/
//! └── 001-add-csv-export/
//!     ├── specification.md
//!     ├── plan.md
//!     └── tasks.md
//! ```
//!
//! Membership is recomputed from a directory scan on every call, so manual
//! edits to the store are always picked up.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 50;

static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]+)-").expect("number prefix regex"));

/// The markdown files an artifact set can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFile {
    Specification,
    Plan,
    Tasks,
}

impl ArtifactFile {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Specification => "specification.md",
            Self::Plan => "plan.md",
            Self::Tasks => "tasks.md",
        }
    }

    /// Human label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Specification => "Specification",
            Self::Plan => "Plan",
            Self::Tasks => "Tasks",
        }
    }

    /// The command that produces this file
    pub fn producer(&self) -> &'static str {
        match self {
            Self::Specification => "specify",
            Self::Plan => "plan",
            Self::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for ArtifactFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// One feature directory found in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Leading number of the directory name, 0 when it has none
    pub number: u64,
    pub path: PathBuf,
}

/// Filesystem-backed store of feature artifact sets
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`; nothing is touched on disk until a write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "ArtifactStore::new: called");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All directories in the store, ordered by number then name
    ///
    /// An absent root is an empty store.
    pub fn list(&self) -> Result<Vec<ArtifactSet>, PipelineError> {
        debug!(root = ?self.root, "ArtifactStore::list: called");
        if !self.root.exists() {
            debug!("ArtifactStore::list: root does not exist");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| PipelineError::io("read", &self.root, e))?;

        let mut sets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::io("read", &self.root, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            sets.push(ArtifactSet {
                number: parse_number(&name),
                path,
            });
        }

        sets.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));
        debug!(count = sets.len(), "ArtifactStore::list: scanned");
        Ok(sets)
    }

    /// Number the next artifact set will get: max existing + 1, or 1
    pub fn next_number(&self) -> Result<u64, PipelineError> {
        let max = self.list()?.iter().map(|s| s.number).max().unwrap_or(0);
        max.checked_add(1)
            .ok_or_else(|| PipelineError::Validation(format!("No artifact numbers left after {}", max)))
    }

    /// Create a new numbered directory for a feature
    ///
    /// Returns the directory and its number.
    pub fn allocate(&self, feature_description: &str) -> Result<(PathBuf, u64), PipelineError> {
        debug!(root = ?self.root, "ArtifactStore::allocate: called");
        fs::create_dir_all(&self.root).map_err(|e| PipelineError::io("create", &self.root, e))?;

        let number = self.next_number()?;
        let slug = slugify(feature_description);
        let dir = self.root.join(format!("{:03}-{}", number, slug));

        fs::create_dir_all(&dir).map_err(|e| PipelineError::io("create", &dir, e))?;
        info!(number, %slug, dir = %dir.display(), "Allocated artifact set");
        Ok((dir, number))
    }

    /// Directory with the highest number, if the store holds any directory
    pub fn find_latest(&self) -> Result<Option<PathBuf>, PipelineError> {
        debug!(root = ?self.root, "ArtifactStore::find_latest: called");
        Ok(self.list()?.pop().map(|s| s.path))
    }

    /// Path of `file` inside `dir`, failing with NotFound when it does not exist
    pub fn require(&self, dir: &Path, file: ArtifactFile) -> Result<PathBuf, PipelineError> {
        let path = dir.join(file.file_name());
        if path.is_file() {
            Ok(path)
        } else {
            debug!(?path, "ArtifactStore::require: missing");
            Err(PipelineError::NotFound(format!(
                "{} file not found at {}. Run 'sg {}' first.",
                file.label(),
                path.display(),
                file.producer()
            )))
        }
    }

    pub fn read(&self, path: &Path) -> Result<String, PipelineError> {
        debug!(?path, "ArtifactStore::read: called");
        fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::NotFound(format!("File not found: {}", path.display())),
            _ => PipelineError::io("read", path, e),
        })
    }

    /// Write `text` to `path`, creating parent directories; last writer wins
    pub fn write(&self, path: &Path, text: &str) -> Result<(), PipelineError> {
        debug!(?path, len = text.len(), "ArtifactStore::write: called");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PipelineError::io("create", parent, e))?;
        }
        fs::write(path, text).map_err(|e| PipelineError::io("write", path, e))
    }
}

/// Leading integer of a directory name like `007-feature`, 0 when absent
///
/// A digit run too long for `u64` pins to `u64::MAX`.
fn parse_number(name: &str) -> u64 {
    NUMBER_PREFIX
        .captures(name)
        .map(|c| c[1].parse().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Whitespace (including the ASCII file/group/record/unit separators),
/// underscore and hyphen all start a hyphen run
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c) || c == '_' || c == '-'
}

/// Convert text to a filesystem-safe slug
///
/// Lowercases, turns whitespace/underscore/hyphen runs into one hyphen, drops
/// everything outside `[a-z0-9-]`, trims hyphens and caps the length at
/// [`MAX_SLUG_LEN`]. Dropped characters do not split a hyphen run.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len().min(MAX_SLUG_LEN * 2));
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if is_separator(c) {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }

    // slug is pure ASCII here, so byte truncation is safe
    slug.truncate(MAX_SLUG_LEN);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
