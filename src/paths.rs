//! Include path resolution.
//!
//! Include targets are resolved lexically: no filesystem I/O happens here, the
//! loader classifies the resulting paths when they are queued.

use crate::error::{CascadeError, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve an include target against the directory of the including file.
///
/// Absolute targets are used as-is; relative ones require `base`.
pub fn resolve_include(target: &str, base: Option<&Path>) -> Result<PathBuf> {
    let target = target.trim();
    if target.is_empty() {
        return Err(CascadeError::invalid_include(target, "empty include path"));
    }
    if target.contains('\0') {
        return Err(CascadeError::invalid_include(target, "path contains NUL byte"));
    }

    let path = Path::new(target);
    if path.is_absolute() {
        return Ok(normalize_path_components(path));
    }

    match base {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(normalize_path_components(&dir.join(path))),
        _ => Err(CascadeError::invalid_include(
            target,
            "relative include without a context directory",
        )),
    }
}

/// Directory containing `file`. A bare relative file name lives in `.`.
pub fn parent_dir(file: &Path) -> Option<PathBuf> {
    match file.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Some(PathBuf::from(".")),
        Some(dir) => Some(dir.to_path_buf()),
        None => None,
    }
}

/// Resolve `.` and `..` without touching the filesystem.
pub fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => components.push(Component::Prefix(p)),
            Component::RootDir => components.push(Component::RootDir),
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else if !matches!(components.last(), Some(Component::RootDir)) {
                    // Leading `..` on a relative path is kept
                    components.push(Component::ParentDir);
                }
            }
            Component::Normal(name) => components.push(Component::Normal(name)),
        }
    }

    components.iter().collect()
}
