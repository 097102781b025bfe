#![allow(dead_code, missing_docs, clippy::unwrap_used)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use fs_namespace::fs::{DirScan, FileAttributes, FileRecord, Filesystem};
use fs_namespace::namespace::{FolderServices, FsFolder, PersistFolder as _, parse_absolute};
use fs_namespace::notify::{ChangeEvent, ChangeNotifier};
use fs_namespace::registry::StaticTypeRegistry;

/// A fixed, non-epoch timestamp for records built by the mock.
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + secs)
}

#[derive(Default)]
struct MemoryState {
    /// Every entry, keyed by absolute path, in insertion order.
    entries: Vec<(PathBuf, FileRecord)>,
    contents: HashMap<PathBuf, String>,
    /// Directories that also report raw `.` and `..` entries.
    dot_entries: Vec<PathBuf>,
    /// Scans of these directories fail after yielding this many entries.
    fail_after: HashMap<PathBuf, usize>,
    /// Stats of these paths fail even when the entry exists.
    fail_stat: Vec<PathBuf>,
    renames: Vec<(PathBuf, PathBuf)>,
    scans: usize,
}

impl MemoryState {
    fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|(p, _)| p == path)
    }
}

/// An in-memory directory tree rooted at `/`.
///
/// Children are listed in insertion order. Lookups are case-sensitive.
#[derive(Default)]
pub struct MemoryFs {
    state: Mutex<MemoryState>,
}

impl MemoryFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, path: &str, record: FileRecord) -> &Self {
        let path = PathBuf::from(path);
        let mut state = self.state.lock().unwrap();
        match state.position(&path) {
            Some(i) => state.entries[i].1 = record,
            None => state.entries.push((path, record)),
        }
        drop(state);
        self
    }

    /// Add a directory at the absolute `path`. Parents are not created.
    pub fn add_dir(&self, path: &str) -> &Self {
        self.insert(path, FileRecord::directory(leaf(path)).with_modified(at(0)))
    }

    /// Add a regular file of `size` bytes at the absolute `path`.
    pub fn add_file(&self, path: &str, size: u64) -> &Self {
        self.insert(path, FileRecord::file(leaf(path), size).with_modified(at(0)))
    }

    /// Add a file whose contents can be read back.
    pub fn add_text(&self, path: &str, text: &str) -> &Self {
        self.add_file(path, text.len() as u64);
        self.state
            .lock()
            .unwrap()
            .contents
            .insert(PathBuf::from(path), text.to_owned());
        self
    }

    /// Add attribute bits to an existing entry.
    pub fn set_attributes(&self, path: &str, attributes: FileAttributes) -> &Self {
        self.update(path, |r| r.attributes |= attributes)
    }

    pub fn set_modified(&self, path: &str, modified: SystemTime) -> &Self {
        self.update(path, |r| r.modified = modified)
    }

    fn update(&self, path: &str, f: impl FnOnce(&mut FileRecord)) -> &Self {
        let mut state = self.state.lock().unwrap();
        let i = state.position(Path::new(path)).unwrap();
        f(&mut state.entries[i].1);
        drop(state);
        self
    }

    /// Make scans of `dir` report `.` and `..` before the real children.
    pub fn with_dot_entries(&self, dir: &str) -> &Self {
        self.state.lock().unwrap().dot_entries.push(PathBuf::from(dir));
        self
    }

    /// Make scans of `dir` fail after `n` entries.
    pub fn fail_scan_after(&self, dir: &str, n: usize) -> &Self {
        self.state
            .lock()
            .unwrap()
            .fail_after
            .insert(PathBuf::from(dir), n);
        self
    }

    /// Make stats of `path` fail with `EIO`.
    pub fn fail_stat(&self, path: &str) -> &Self {
        self.state.lock().unwrap().fail_stat.push(PathBuf::from(path));
        self
    }

    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state.lock().unwrap().renames.clone()
    }

    pub fn scan_count(&self) -> usize {
        self.state.lock().unwrap().scans
    }

    pub fn contains(&self, path: &str) -> bool {
        self.exists(Path::new(path))
    }
}

fn leaf(path: &str) -> &str {
    path.rsplit('/').next().unwrap()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, path.display().to_string())
}

impl Filesystem for MemoryFs {
    fn scan_dir(&self, dir: &Path) -> io::Result<DirScan<'_>> {
        let mut state = self.state.lock().unwrap();
        if dir != Path::new("/") {
            match state.position(dir) {
                Some(i) if state.entries[i].1.is_dir() => {}
                Some(_) => return Err(io::Error::other("not a directory")),
                None => return Err(not_found(dir)),
            }
        }
        state.scans += 1;

        let mut records: Vec<io::Result<FileRecord>> = Vec::new();
        if state.dot_entries.iter().any(|d| d == dir) {
            records.push(Ok(FileRecord::directory(".")));
            records.push(Ok(FileRecord::directory("..")));
        }
        records.extend(
            state
                .entries
                .iter()
                .filter(|(p, _)| p.parent() == Some(dir))
                .map(|(_, r)| Ok(r.clone())),
        );
        if let Some(&n) = state.fail_after.get(dir) {
            records.truncate(n);
            records.push(Err(io::Error::from_raw_os_error(libc::EIO)));
        }
        Ok(Box::new(records.into_iter()))
    }

    fn stat(&self, path: &Path) -> io::Result<FileRecord> {
        if path == Path::new("/") {
            return Ok(FileRecord::directory("/"));
        }
        let state = self.state.lock().unwrap();
        if state.fail_stat.iter().any(|p| p == path) {
            return Err(io::Error::from_raw_os_error(libc::EIO));
        }
        state
            .position(path)
            .map(|i| state.entries[i].1.clone())
            .ok_or_else(|| not_found(path))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.position(from).is_none() {
            return Err(not_found(from));
        }
        if state.position(to).is_some() {
            return Err(io::Error::from_raw_os_error(libc::EEXIST));
        }
        let new_name = to
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap()
            .to_owned();
        for (path, record) in &mut state.entries {
            if path == from {
                record.name.clone_from(&new_name);
                *path = to.to_path_buf();
            } else if let Ok(rest) = path.strip_prefix(from) {
                *path = to.join(rest);
            }
        }
        if let Some(text) = state.contents.remove(from) {
            state.contents.insert(to.to_path_buf(), text);
        }
        state.renames.push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.state
            .lock()
            .unwrap()
            .contents
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }
}

/// Collects every change event it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify(&self, event: &ChangeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn services(fs: &Arc<MemoryFs>) -> FolderServices {
    services_with(fs, StaticTypeRegistry::new())
}

pub fn services_with(fs: &Arc<MemoryFs>, registry: StaticTypeRegistry) -> FolderServices {
    FolderServices::new(fs.clone(), Arc::new(registry))
}

/// A filesystem folder rooted at the absolute `path`, initialized from its parsed list.
pub fn folder_at(services: &FolderServices, path: &str) -> FsFolder {
    let ids = parse_absolute(services, Path::new(path)).unwrap();
    let mut folder = FsFolder::new(services.clone());
    folder.initialize(ids).unwrap();
    folder
}

/// The tree most tests start from:
///
/// ```text
/// /data
/// ├── docs/
/// │   └── nested/
/// ├── empty/
/// ├── .secret/      (hidden)
/// ├── alpha.txt     (10 bytes)
/// ├── Beta.TXT      (300 bytes)
/// ├── readme        (5 bytes)
/// └── tool.lnk      (1 byte)
/// ```
pub fn sample_tree() -> Arc<MemoryFs> {
    let fs = MemoryFs::new();
    fs.add_dir("/data")
        .add_dir("/data/docs")
        .add_dir("/data/docs/nested")
        .add_dir("/data/empty")
        .add_dir("/data/.secret")
        .set_attributes("/data/.secret", FileAttributes::HIDDEN)
        .add_file("/data/alpha.txt", 10)
        .add_file("/data/Beta.TXT", 300)
        .add_file("/data/readme", 5)
        .add_file("/data/tool.lnk", 1);
    fs
}
