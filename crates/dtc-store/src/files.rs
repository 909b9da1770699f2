//! Upload staging: copying submitted files under report-specific names.

use crate::StoreError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Image extensions accepted for attachment to a report
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// True for `.jpg` / `.jpeg` names, any case
pub fn is_allowed_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// `.ext` of `source`, or `.bin` when it has none (or an odd one)
fn staged_extension(source: &Path) -> String {
    match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!(".{}", ext)
        }
        _ => ".bin".to_string(),
    }
}

/// Copy `source` into `dest_dir` as `<prefix><ext>`, creating the directory
pub fn stage_file(source: &Path, dest_dir: &Path, prefix: &str) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(dest_dir).map_err(|source| StoreError::Io {
        path: dest_dir.display().to_string(),
        source,
    })?;

    let target = dest_dir.join(format!("{}{}", prefix, staged_extension(source)));
    std::fs::copy(source, &target).map_err(|err| StoreError::Io {
        path: source.display().to_string(),
        source: err,
    })?;

    debug!("staged {} as {}", source.display(), target.display());
    Ok(target)
}

/// Remove files, ignoring any that are missing or cannot be removed.
///
/// Returns how many were actually deleted.
pub fn remove_files<I, P>(paths: I) -> usize
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut removed = 0;
    for path in paths {
        let path: &Path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => debug!("could not remove {}: {}", path.display(), err),
        }
    }
    removed
}
