//! Depth-bounded recursive watch installation.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::WatcherError;
use crate::Result;

/// Something directories can be registered with.
pub trait WatchRegistry {
    /// Start watching a single directory (not its children).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be watched.
    fn register(&mut self, path: &Path) -> Result<()>;
}

/// Register each root and its subdirectories down to `max_depth`.
///
/// Depth is counted in directory levels below the root: the root is depth 0,
/// its children depth 1, and so on. A directory at exactly `max_depth` is
/// registered; nothing below it is visited. Any failure aborts the whole
/// installation.
///
/// Returns the registered directories in registration order.
///
/// # Errors
///
/// Returns an error if a directory cannot be walked or registered.
pub fn install_watches<R>(
    registry: &mut R,
    roots: &[PathBuf],
    max_depth: usize,
) -> Result<Vec<PathBuf>>
where
    R: WatchRegistry + ?Sized,
{
    let mut registered = Vec::new();

    for root in roots {
        registry.register(root)?;
        tracing::debug!(path = %root.display(), depth = 0, "Watching directory");
        registered.push(root.clone());

        if max_depth == 0 {
            continue;
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| entry.file_type().is_dir());

        for entry in walker {
            let entry = entry.map_err(|e| WatcherError::WalkFailed {
                path: e.path().unwrap_or(root.as_path()).display().to_string(),
                reason: e.to_string(),
            })?;

            registry.register(entry.path())?;
            tracing::debug!(
                path = %entry.path().display(),
                depth = entry.depth(),
                "Watching directory"
            );
            registered.push(entry.into_path());
        }
    }

    tracing::info!(
        roots = roots.len(),
        directories = registered.len(),
        max_depth,
        "Watches installed"
    );

    Ok(registered)
}
