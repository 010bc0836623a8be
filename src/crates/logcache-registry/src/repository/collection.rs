use crate::repository::error::{RepositoryError, Result};
use crate::repository::{File, Status};
use logcache_common::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The discovered log files, ordered by nominal start time.
///
/// Files whose header could not be read (start time zero) are never part of a
/// chain, and at most one file is kept per start time: the first one inserted
/// wins. Discovery inserts the active file first, so a rotated copy that still
/// carries the active file's header never shadows it.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    /// Ordered collection of files maintaining the sorting invariant
    pub(crate) files: Vec<File>,
}

impl Chain {
    /// Discover the active log file and every rotated file in `archive_dir`.
    ///
    /// Discovery never fails as a whole. An unreadable archive directory or a
    /// malformed file is reported and skipped.
    pub fn discover(log_file: &Path, archive_dir: &Path) -> Self {
        let mut chain = Chain::default();
        let mut seen = HashSet::default();

        seen.insert(log_file.to_path_buf());
        chain.insert_file(File::probe(log_file, Status::Active));

        match scan_archive(archive_dir) {
            Ok(paths) => {
                for path in paths {
                    if seen.insert(path.clone()) {
                        chain.insert_file(File::probe(path, Status::Archived));
                    }
                }
            }
            Err(e) => {
                info!("Cannot open log archive '{}': {}", archive_dir.display(), e);
            }
        }

        debug!(
            "Discovered {} log files (active: {})",
            chain.len(),
            chain.files.iter().any(File::is_active)
        );

        chain
    }

    /// Insert a file maintaining sorted order.
    ///
    /// Returns `false` if the file was rejected because its start time is
    /// unknown or already taken.
    pub fn insert_file(&mut self, file: File) -> bool {
        if file.since().is_zero() {
            debug!("Skipping logfile '{}' without start time", file.path().display());
            return false;
        }

        let pos = self.files.partition_point(|f| f.since() < file.since());

        if let Some(existing) = self.files.get(pos) {
            if existing.since() == file.since() {
                if *existing != file {
                    warn!(
                        "Logfiles '{}' and '{}' have the same start time {}, ignoring the latter",
                        existing.path().display(),
                        file.path().display(),
                        file.since()
                    );
                }
                return false;
            }
        }

        self.files.insert(pos, file);
        true
    }

    /// Iterate from the oldest to the newest file
    pub fn iter(&self) -> std::slice::Iter<'_, File> {
        self.files.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}

impl IntoIterator for Chain {
    type Item = File;
    type IntoIter = std::vec::IntoIter<File>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a File;
    type IntoIter = std::slice::Iter<'a, File>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// List the candidate log files directly inside `dir`.
///
/// Hidden entries (names starting with `.`) are skipped. Entries that are not
/// regular files are returned too; probing them simply fails.
pub fn scan_archive(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RepositoryError::Io {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        });
    }

    let mut paths = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;

        let hidden = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false);

        if !hidden {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}
