//! Thumbnail selection.

use crate::archive::EntryKind;

/// Top-level directory macOS adds to archives it creates.
const MACOS_METADATA_DIR: &str = "__MACOSX";

/// Pick the image entry that represents an archive.
///
/// The lexicographically smallest image path wins, skipping macOS resource
/// fork metadata. Returns `None` when the archive holds no images.
pub fn select_cover<'a, I>(paths: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    paths
        .into_iter()
        .filter(|path| EntryKind::from_path(path) == EntryKind::Image)
        .filter(|path| path.split('/').next() != Some(MACOS_METADATA_DIR))
        .min()
}
