use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};

/// Enumerate the regular files under `folder`.
///
/// Immediate children only unless `recursive`; symlinks are not followed.
/// When a filter is given, only files whose lower-cased extension appears
/// in it are kept (entries may be given with or without the leading dot).
/// The result is sorted so repeated scans of the same tree visit files in
/// the same order.
pub(crate) async fn discover(
    folder: &Path,
    recursive: bool,
    extension_filter: Option<&[String]>,
) -> Result<Vec<PathBuf>> {
    let filter: Option<Vec<String>> = extension_filter.map(|extensions| {
        extensions
            .iter()
            .map(|extension| {
                let extension = extension.to_lowercase();
                if extension.starts_with('.') { extension } else { format!(".{extension}") }
            })
            .collect()
    });

    let mut files = Vec::new();
    let mut pending = vec![folder.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await.or_raise(|| ErrorKind::Discovery)?;
        while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Discovery)? {
            let kind = entry.file_type().await.or_raise(|| ErrorKind::Discovery)?;
            if kind.is_dir() {
                if recursive {
                    pending.push(entry.path());
                }
            } else if kind.is_file() {
                let path = entry.path();
                if matches_filter(&path, filter.as_deref()) {
                    files.push(path);
                }
            }
        }
    }
    files.sort();
    Ok(files)
}

fn matches_filter(path: &Path, filter: Option<&[String]>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let Some(extension) = path.extension() else {
        return false;
    };
    let extension = format!(".{}", extension.to_string_lossy().to_lowercase());
    filter.iter().any(|candidate| *candidate == extension)
}
