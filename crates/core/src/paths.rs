// crates/core/src/paths.rs
//! Download directory validation and the writability probe.

use std::path::{Component, Path, PathBuf};

use crate::error::{FetchError, PathError};

/// Name of the throwaway file written to prove a directory is writable.
const PROBE_FILE: &str = ".test_write";

/// Validate a client-supplied download directory.
///
/// Relative paths not already starting with `./` are anchored with `./`.
/// The path is then normalized lexically; if any `..` segment survives
/// normalization the path escapes its anchor and is rejected.
pub fn validate_custom_path(raw: &str) -> Result<PathBuf, PathError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('\0') {
        return Err(PathError::InvalidFormat);
    }

    let anchored = if Path::new(raw).is_absolute() || raw.starts_with("./") {
        PathBuf::from(raw)
    } else {
        PathBuf::from(format!("./{raw}"))
    };

    let normalized = normalize_lexically(&anchored);
    if normalized
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(PathError::Traversal);
    }
    Ok(anchored)
}

/// Collapse `.` and `name/..` pairs without touching the filesystem.
///
/// A `..` directly under the root is dropped (the root's parent is the root);
/// a leading `..` on a relative path is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Create `dir` if needed and prove it is writable by writing and removing
/// a probe file.
pub async fn ensure_writable_dir(dir: &Path) -> Result<(), FetchError> {
    let access_err = |source| FetchError::DirectoryAccess {
        path: dir.to_path_buf(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(access_err)?;

    let probe = dir.join(PROBE_FILE);
    tokio::fs::write(&probe, b"test").await.map_err(access_err)?;
    tokio::fs::remove_file(&probe).await.map_err(access_err)?;

    tracing::debug!(dir = %dir.display(), "download directory is writable");
    Ok(())
}
