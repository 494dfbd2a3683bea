//! The artifact under review.
//!
//! An artifact is an opaque handle exposing text documents addressable by
//! path, plus a way to turn a [`Locator`] into a human-readable citation.
//! Nothing here renders or executes the artifact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{Locator, Result, RubricaError};

/// Files larger than this are skipped when reading a directory artifact.
pub const MAX_DOCUMENT_BYTES: u64 = 1024 * 1024;

/// Read-only view over the thing under review.
pub trait Artifact: Send + Sync {
    /// Display name, used to cite whole-artifact evidence.
    fn name(&self) -> &str;

    /// Documents as `(path, text)` in ascending path order.
    fn documents(&self) -> Vec<(&str, &str)>;

    /// Render a locator as a citation string.
    fn cite(&self, locator: &Locator) -> String {
        match locator {
            Locator::Lines { path, start, end } if start == end => format!("{path}:{start}"),
            Locator::Lines { path, start, end } => format!("{path}:{start}-{end}"),
            Locator::Section { name } => format!("§{name}"),
            Locator::Whole => self.name().to_string(),
        }
    }
}

/// Artifact backed by in-memory documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifact {
    name: String,
    documents: BTreeMap<String, String>,
}

impl MemoryArtifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: BTreeMap::new(),
        }
    }

    pub fn with_document(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(path.into(), text.into());
        self
    }
}

impl Artifact for MemoryArtifact {
    fn name(&self) -> &str {
        &self.name
    }

    fn documents(&self) -> Vec<(&str, &str)> {
        self.documents
            .iter()
            .map(|(p, t)| (p.as_str(), t.as_str()))
            .collect()
    }
}

/// Artifact read from a file or a directory tree on disk.
///
/// The tree is read eagerly and held in memory, so locating evidence never
/// touches the filesystem again. Hidden entries, non-UTF-8 files and files
/// above [`MAX_DOCUMENT_BYTES`] are skipped. Paths are relative to the root
/// and use `/` separators.
#[derive(Debug, Clone)]
pub struct FsArtifact {
    root: PathBuf,
    inner: MemoryArtifact,
}

impl FsArtifact {
    pub fn open(root: &Path) -> Result<Self> {
        let meta = std::fs::metadata(root).map_err(|e| {
            RubricaError::Artifact(format!("cannot open artifact {}: {e}", root.display()))
        })?;
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let mut inner = MemoryArtifact::new(name);

        if meta.is_file() {
            let rel = inner.name.clone();
            if let Some(text) = read_text(root, meta.len())? {
                inner.documents.insert(rel, text);
            }
        } else {
            collect_dir(root, root, &mut inner.documents)?;
        }

        debug!(
            root = %root.display(),
            documents = inner.documents.len(),
            "artifact loaded"
        );
        Ok(Self {
            root: root.to_path_buf(),
            inner,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Artifact for FsArtifact {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn documents(&self) -> Vec<(&str, &str)> {
        self.inner.documents()
    }
}

fn collect_dir(root: &Path, dir: &Path, out: &mut BTreeMap<String, String>) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let meta = entry.metadata()?;
        if meta.is_dir() {
            collect_dir(root, &path, out)?;
        } else if meta.is_file() {
            if let Some(text) = read_text(&path, meta.len())? {
                out.insert(relative_path(root, &path), text);
            }
        }
    }
    Ok(())
}

fn read_text(path: &Path, len: u64) -> Result<Option<String>> {
    if len > MAX_DOCUMENT_BYTES {
        debug!(path = %path.display(), len, "skipping oversized document");
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8(bytes).ok())
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cite_formats() {
        let a = MemoryArtifact::new("checkout-ui");
        assert_eq!(
            a.cite(&Locator::Lines {
                path: "src/form.tsx".into(),
                start: 12,
                end: 12
            }),
            "src/form.tsx:12"
        );
        assert_eq!(
            a.cite(&Locator::Lines {
                path: "src/form.tsx".into(),
                start: 12,
                end: 14
            }),
            "src/form.tsx:12-14"
        );
        assert_eq!(
            a.cite(&Locator::Section {
                name: "Header".into()
            }),
            "§Header"
        );
        assert_eq!(a.cite(&Locator::Whole), "checkout-ui");
    }

    #[test]
    fn test_memory_documents_sorted() {
        let a = MemoryArtifact::new("x")
            .with_document("b.txt", "b")
            .with_document("a.txt", "a");
        let paths: Vec<&str> = a.documents().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_fs_artifact_walks_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/components")).unwrap();
        std::fs::write(dir.path().join("src/components/Button.tsx"), "<button/>").unwrap();
        std::fs::write(dir.path().join("README.md"), "# App").unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        std::fs::write(dir.path().join("logo.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let a = FsArtifact::open(dir.path()).unwrap();
        let paths: Vec<&str> = a.documents().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["README.md", "src/components/Button.tsx"]);
    }

    #[test]
    fn test_fs_artifact_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, "<h1>Hi</h1>").unwrap();

        let a = FsArtifact::open(&file).unwrap();
        assert_eq!(a.name(), "page.html");
        assert_eq!(a.documents(), vec![("page.html", "<h1>Hi</h1>")]);
    }

    #[test]
    fn test_fs_artifact_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsArtifact::open(&dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("cannot open artifact"));
    }
}
