// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page store — the on-disk layout of a run.
//
//   <base>/<sanitised device name>/            finished documents
//   <base>/<sanitised device name>/temp/       pg_001.png, pg_002.png, ...
//
// Page files carry a zero-padded index so filename order is acquisition
// order. Anything in temp/ that is not a page file is ignored when listing.

use std::path::{Path, PathBuf};

use syscan_core::error::Result;
use syscan_core::types::CleanupWarning;
use tracing::{debug, info, instrument, warn};

/// Name of the per-run scratch directory inside a device folder.
pub const TEMP_DIR_NAME: &str = "temp";

/// Folder name used when a device name has no usable characters.
const FALLBACK_FOLDER: &str = "unnamed";

const PAGE_PREFIX: &str = "pg_";
const PAGE_EXTENSION: &str = "png";

/// Extensions the cleanup pass treats as disposable images.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Keep alphanumerics, spaces, `_` and `-`; drop everything else.
pub fn sanitize_device_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect()
}

/// `pg_<index>.png` with the index zero-padded to three digits.
pub fn page_file_name(index: u32) -> String {
    format!("{PAGE_PREFIX}{index:03}.{PAGE_EXTENSION}")
}

/// Index of a page file name, or `None` if the name is not a page file.
pub fn parse_page_index(file_name: &str) -> Option<u32> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if !ext.eq_ignore_ascii_case(PAGE_EXTENSION) {
        return None;
    }
    let digits = stem.strip_prefix(PAGE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|index| *index > 0)
}

fn is_image_file_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// One device's output folder and its scratch directory.
#[derive(Debug, Clone)]
pub struct PageStore {
    root: PathBuf,
    temp: PathBuf,
}

impl PageStore {
    /// Locate the folders for `device_name` under `base_dir`, creating them
    /// if absent. Existing folders are reused as they are.
    #[instrument(skip(base_dir), fields(base = %base_dir.display()))]
    pub fn open(base_dir: &Path, device_name: &str) -> Result<Self> {
        let mut folder = sanitize_device_name(device_name);
        if folder.trim().is_empty() {
            folder = FALLBACK_FOLDER.to_owned();
        }
        let root = base_dir.join(folder);
        let temp = root.join(TEMP_DIR_NAME);
        std::fs::create_dir_all(&temp)?;
        debug!(root = %root.display(), "page store ready");
        Ok(Self { root, temp })
    }

    /// Device folder; finished documents are written here.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch directory holding the page images of the current run.
    pub fn temp_dir(&self) -> &Path {
        &self.temp
    }

    /// Where page `index` is stored.
    pub fn page_path(&self, index: u32) -> PathBuf {
        self.temp.join(page_file_name(index))
    }

    /// Page files currently stored, in acquisition order.
    pub fn list_pages(&self) -> Result<Vec<(u32, PathBuf)>> {
        let entries = match std::fs::read_dir(&self.temp) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut pages = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(index) = name.to_str().and_then(parse_page_index) else {
                continue;
            };
            if entry.file_type()?.is_file() {
                pages.push((index, entry.path()));
            }
        }
        // Numeric order equals filename order up to 999 pages and stays
        // correct beyond.
        pages.sort_by_key(|(index, _)| *index);
        Ok(pages)
    }

    /// Delete consumed page files. Failures are returned, not raised.
    pub fn remove_pages(&self, pages: &[PathBuf]) -> Vec<CleanupWarning> {
        pages
            .iter()
            .filter_map(|path| match std::fs::remove_file(path) {
                Ok(()) => None,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
                Err(err) => Some(CleanupWarning {
                    path: path.clone(),
                    reason: err.to_string(),
                }),
            })
            .collect()
    }

    /// Remove the scratch directory if it holds nothing but image files.
    ///
    /// Remaining images are deleted first. When anything else is present
    /// (a subdirectory, a stray document) the directory is left alone and a
    /// warning describing why is returned.
    #[instrument(skip(self), fields(temp = %self.temp.display()))]
    pub fn cleanup_temp_dir(&self) -> Vec<CleanupWarning> {
        let entries: Vec<std::fs::DirEntry> = match std::fs::read_dir(&self.temp) {
            Ok(entries) => entries.filter_map(|entry| entry.ok()).collect(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                return vec![CleanupWarning {
                    path: self.temp.clone(),
                    reason: err.to_string(),
                }];
            }
        };

        let unexpected = entries
            .iter()
            .filter(|entry| {
                let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
                !(is_file && entry.file_name().to_str().is_some_and(is_image_file_name))
            })
            .count();
        if unexpected > 0 {
            warn!(unexpected, "temp folder holds other files; left in place");
            return vec![CleanupWarning {
                path: self.temp.clone(),
                reason: format!("{unexpected} unexpected entries; folder kept"),
            }];
        }

        let mut warnings: Vec<CleanupWarning> = entries
            .iter()
            .filter_map(|entry| {
                std::fs::remove_file(entry.path())
                    .err()
                    .map(|err| CleanupWarning {
                        path: entry.path(),
                        reason: err.to_string(),
                    })
            })
            .collect();

        if warnings.is_empty() {
            match std::fs::remove_dir(&self.temp) {
                Ok(()) => info!("temp folder removed"),
                Err(err) => warnings.push(CleanupWarning {
                    path: self.temp.clone(),
                    reason: err.to_string(),
                }),
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_spaces_and_allowed_punctuation() {
        assert_eq!(sanitize_device_name("HP ScanJet 2000"), "HP ScanJet 2000");
        assert_eq!(sanitize_device_name("A/B:Scanner*"), "ABScanner");
        assert_eq!(sanitize_device_name("Epson_V39-II (USB)"), "Epson_V39-II USB");
    }

    #[test]
    fn page_names_sort_in_acquisition_order() {
        assert_eq!(page_file_name(1), "pg_001.png");
        assert_eq!(page_file_name(42), "pg_042.png");
        let mut names: Vec<String> = [10, 2, 1, 100, 9].map(page_file_name).to_vec();
        names.sort();
        assert_eq!(
            names,
            vec!["pg_001.png", "pg_002.png", "pg_009.png", "pg_010.png", "pg_100.png"]
        );
    }

    #[test]
    fn parse_recognises_only_page_files() {
        assert_eq!(parse_page_index("pg_001.png"), Some(1));
        assert_eq!(parse_page_index("pg_017.PNG"), Some(17));
        assert_eq!(parse_page_index("pg_1234.png"), Some(1234));
        assert_eq!(parse_page_index("pg_000.png"), None);
        assert_eq!(parse_page_index("pg_abc.png"), None);
        assert_eq!(parse_page_index("pg_.png"), None);
        assert_eq!(parse_page_index("pg_001.jpg"), None);
        assert_eq!(parse_page_index("tmp_0f3a.jpg"), None);
        assert_eq!(parse_page_index("notes.txt"), None);
    }

    #[test]
    fn open_is_idempotent_and_nests_temp() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path(), "HP ScanJet 2000").unwrap();
        assert_eq!(store.root(), tmp.path().join("HP ScanJet 2000"));
        assert_eq!(store.temp_dir(), tmp.path().join("HP ScanJet 2000").join("temp"));

        std::fs::write(store.page_path(1), b"x").unwrap();
        let again = PageStore::open(tmp.path(), "HP ScanJet 2000").unwrap();
        assert!(again.page_path(1).exists());
    }

    #[test]
    fn unusable_name_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path(), "***").unwrap();
        assert_eq!(store.root(), tmp.path().join("unnamed"));
    }

    #[test]
    fn listing_ignores_foreign_files_and_orders_numerically() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path(), "dev").unwrap();
        for name in ["pg_010.png", "pg_002.png", "pg_1000.png", "readme.txt", "tmp_ab.jpg"] {
            std::fs::write(store.temp_dir().join(name), b"x").unwrap();
        }
        std::fs::create_dir(store.temp_dir().join("pg_003.png")).unwrap();

        let indices: Vec<u32> = store.list_pages().unwrap().into_iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![2, 10, 1000]);
    }

    #[test]
    fn cleanup_removes_folder_holding_only_images() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path(), "dev").unwrap();
        std::fs::write(store.temp_dir().join("pg_001.png"), b"x").unwrap();
        std::fs::write(store.temp_dir().join("stray.JPG"), b"x").unwrap();

        assert!(store.cleanup_temp_dir().is_empty());
        assert!(!store.temp_dir().exists());
        assert!(store.root().exists());
        // Nothing to do the second time around.
        assert!(store.cleanup_temp_dir().is_empty());
    }

    #[test]
    fn cleanup_keeps_folder_with_unexpected_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path(), "dev").unwrap();
        std::fs::write(store.temp_dir().join("pg_001.png"), b"x").unwrap();
        std::fs::write(store.temp_dir().join("notes.txt"), b"keep me").unwrap();

        let warnings = store.cleanup_temp_dir();
        assert_eq!(warnings.len(), 1);
        assert!(store.temp_dir().join("notes.txt").exists());
        assert!(store.temp_dir().join("pg_001.png").exists());
    }

    #[test]
    fn removing_missing_pages_is_silent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PageStore::open(tmp.path(), "dev").unwrap();
        assert!(store.remove_pages(&[store.page_path(7)]).is_empty());
    }
}
