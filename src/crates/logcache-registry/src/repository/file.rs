use logcache_common::Seconds;
use std::cmp::Ordering;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Length of the nominal header at the front of every log file: `[`, ten
/// decimal digits and `]`.
pub const HEADER_LEN: usize = 12;

/// Status of a log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The current log file, still being appended to
    Active,
    /// A rotated log file that no longer changes
    Archived,
}

/// Stable identity of the inode behind a path.
///
/// Two handles with the same identity refer to the same file. A log file that
/// was replaced (rotated away and recreated) has a new identity even though the
/// path is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    /// Identity of an open file, if the platform exposes one.
    #[cfg(unix)]
    pub fn of(metadata: &fs::Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;

        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    pub fn of(_metadata: &fs::Metadata) -> Option<Self> {
        None
    }

    /// Identity of the file currently at `path`.
    pub fn of_path(path: &Path) -> Option<Self> {
        fs::metadata(path).ok().as_ref().and_then(Self::of)
    }
}

/// Parse the nominal start time from the first [`HEADER_LEN`] bytes of a log
/// file.
///
/// Returns `None` unless the prefix is exactly `[` + ten digits + `]` and the
/// value fits in a [`Seconds`].
pub fn parse_header(prefix: &[u8]) -> Option<Seconds> {
    let prefix = prefix.get(..HEADER_LEN)?;

    if prefix[0] != b'[' || prefix[HEADER_LEN - 1] != b']' {
        return None;
    }

    let digits = &prefix[1..HEADER_LEN - 1];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let value = digits
        .iter()
        .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));

    Seconds::try_from(value).ok()
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub(crate) struct FileInner {
    pub(crate) path: PathBuf,
    pub(crate) status: Status,
    pub(crate) since: Seconds,
    pub(crate) identity: Option<FileIdentity>,
}

/// A discovered log file.
///
/// Cheap to clone. The header is probed once when the file is discovered;
/// [`reprobe`](Self::reprobe) produces a fresh value when the file behind the
/// path has been replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct File {
    pub(crate) inner: Arc<FileInner>,
}

impl File {
    /// Discover the file at `path`, reading its nominal header.
    ///
    /// Never fails: a file that cannot be opened, is shorter than the header
    /// or has a malformed header gets the zero start time, and the condition
    /// is reported as a diagnostic.
    pub fn probe(path: impl Into<PathBuf>, status: Status) -> Self {
        let path = path.into();
        let (since, identity) = probe_header(&path);

        File {
            inner: Arc::new(FileInner {
                path,
                status,
                since,
                identity,
            }),
        }
    }

    /// Probe the path again, keeping the status.
    pub fn reprobe(&self) -> Self {
        Self::probe(self.inner.path.clone(), self.inner.status)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn status(&self) -> Status {
        self.inner.status
    }

    /// Nominal start time from the header, zero if unknown.
    pub fn since(&self) -> Seconds {
        self.inner.since
    }

    /// Identity of the file when it was probed.
    pub fn identity(&self) -> Option<FileIdentity> {
        self.inner.identity
    }

    /// Check if this is the log file that is currently being written to
    pub fn is_active(&self) -> bool {
        matches!(self.inner.status, Status::Active)
    }

    /// Whether the path now refers to a different file than the one probed.
    ///
    /// A file that was missing at probe time and has appeared since counts as
    /// replaced. A file that has disappeared does not: there is nothing to
    /// replace the cache with.
    pub fn is_replaced(&self) -> bool {
        match FileIdentity::of_path(&self.inner.path) {
            Some(current) => self.inner.identity != Some(current),
            None => false,
        }
    }
}

impl Ord for File {
    fn cmp(&self, other: &Self) -> Ordering {
        // Order by nominal start time, then by path for stability
        self.inner
            .since
            .cmp(&other.inner.since)
            .then_with(|| self.inner.path.cmp(&other.inner.path))
    }
}

impl PartialOrd for File {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn probe_header(path: &Path) -> (Seconds, Option<FileIdentity>) {
    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            info!("Cannot open logfile '{}': {}", path.display(), e);
            return (Seconds::ZERO, None);
        }
    };

    let identity = file.metadata().ok().as_ref().and_then(FileIdentity::of);

    let mut prefix = [0u8; HEADER_LEN];
    if let Err(e) = file.read_exact(&mut prefix) {
        // Probably empty
        debug!("Ignoring logfile '{}': {}", path.display(), e);
        return (Seconds::ZERO, identity);
    }

    match parse_header(&prefix) {
        Some(since) => (since, identity),
        None => {
            info!(
                "Ignoring logfile '{}': does not begin with '[1234567890]'",
                path.display()
            );
            (Seconds::ZERO, identity)
        }
    }
}
