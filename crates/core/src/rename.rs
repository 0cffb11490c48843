use crate::number::{find_number, split_extension, AnchorMode};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("リネーム先が既に存在します: {} -> {}", .from.display(), .to.display())]
    Conflict { from: PathBuf, to: PathBuf },
    #[error("リネームに失敗しました: {} -> {}", .from.display(), .to.display())]
    Filesystem {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RenameError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Returns the name with its anchored number zero-padded to `width`, or
/// `None` when the stem carries no number at that anchor.
pub fn compute_new_name(filename: &str, anchor: AnchorMode, width: usize) -> Option<String> {
    let (stem, extension) = split_extension(filename);
    let found = find_number(stem, anchor)?;
    let padded = found.number.padded(width);

    let mut out = String::with_capacity(filename.len() + padded.len());
    out.push_str(&stem[..found.span.start]);
    out.push_str(&padded);
    out.push_str(&stem[found.span.end..]);
    out.push_str(extension);
    Some(out)
}

/// Renames `from` to `to` unless something already occupies `to`.
pub fn rename_entry(from: &Path, to: &Path) -> Result<(), RenameError> {
    if from != to && path_occupied(to) {
        return Err(RenameError::Conflict {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
    }

    fs::rename(from, to).map_err(|source| RenameError::Filesystem {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// Also true for dangling symlinks, which `Path::exists` reports as absent.
pub(crate) fn path_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
