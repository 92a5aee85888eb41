use crate::error::{Result, StoreError};
use crate::patcher::splice_lines;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

/// The single authoritative text of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// Full source text
    pub text: String,

    /// Monotonic per-file modification token; 1 on upload, +1 per patch
    pub revision: u64,
}

/// Result of a successful patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// The new full text
    pub text: String,

    /// The new revision token
    pub revision: u64,
}

/// Process-wide map from file id to its current source text.
///
/// Each file has its own lock, so concurrent patches against one id
/// serialize their read-modify-write instead of silently discarding a
/// concurrent commit; the outer map lock is held only to find the entry.
#[derive(Debug, Default)]
pub struct SourceStore {
    files: RwLock<HashMap<String, Arc<Mutex<SourceRecord>>>>,
    spool: Option<PathBuf>,
}

impl SourceStore {
    /// In-memory store with no persistence collaborator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store backed by a spool directory: records are written through on
    /// every commit and loaded back on a miss
    #[must_use]
    pub fn with_spool(dir: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            spool: Some(dir),
        }
    }

    /// Accept a full source text for a file id, replacing any previous record
    pub fn put(&self, file_id: &str, text: String) -> Result<u64> {
        self.persist(file_id, &text)?;
        let entry = self.entry_or_default(file_id);
        let mut record = entry.lock().expect("source store lock poisoned");
        record.text = text;
        record.revision = 1;
        Ok(record.revision)
    }

    /// Current record for a file id
    pub fn get(&self, file_id: &str) -> Result<SourceRecord> {
        let entry = self.entry_or_load(file_id)?;
        let record = entry.lock().expect("source store lock poisoned");
        Ok(record.clone())
    }

    /// Replace the inclusive line range `start_line..=end_line` and commit
    /// the result as the new current text.
    ///
    /// When `expected_revision` is given it must match the stored record;
    /// a mismatch means the caller's line numbers came from an older text
    /// and the patch is refused. Any failure leaves the record untouched.
    pub fn patch(
        &self,
        file_id: &str,
        start_line: usize,
        end_line: usize,
        replacement: &str,
        expected_revision: Option<u64>,
    ) -> Result<Patched> {
        let entry = self.entry_or_load(file_id)?;
        let mut record = entry.lock().expect("source store lock poisoned");

        if let Some(expected) = expected_revision {
            if expected != record.revision {
                return Err(StoreError::StaleRevision {
                    expected,
                    stored: record.revision,
                });
            }
        }

        let text = splice_lines(&record.text, start_line, end_line, replacement)?;
        self.persist(file_id, &text)?;
        record.text = text;
        record.revision += 1;
        Ok(Patched {
            text: record.text.clone(),
            revision: record.revision,
        })
    }

    fn entry_or_default(&self, file_id: &str) -> Arc<Mutex<SourceRecord>> {
        let mut files = self.files.write().expect("source store lock poisoned");
        files
            .entry(file_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(SourceRecord {
                    text: String::new(),
                    revision: 0,
                }))
            })
            .clone()
    }

    fn entry_or_load(&self, file_id: &str) -> Result<Arc<Mutex<SourceRecord>>> {
        {
            let files = self.files.read().expect("source store lock poisoned");
            if let Some(entry) = files.get(file_id) {
                return Ok(entry.clone());
            }
        }

        let Some(dir) = &self.spool else {
            return Err(StoreError::UnknownFile(file_id.to_string()));
        };
        let path = dir.join(spool_file_name(file_id));
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::UnknownFile(file_id.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        log::debug!("loaded {file_id} from spool");

        let mut files = self.files.write().expect("source store lock poisoned");
        Ok(files
            .entry(file_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SourceRecord { text, revision: 1 })))
            .clone())
    }

    fn persist(&self, file_id: &str, text: &str) -> Result<()> {
        let Some(dir) = &self.spool else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        fs::write(dir.join(spool_file_name(file_id)), text).map_err(|err| {
            log::warn!("spool write failed for {file_id}: {err}");
            err
        })?;
        Ok(())
    }
}

/// Flatten a file id into a spool file name
fn spool_file_name(file_id: &str) -> String {
    file_id
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.') {
                ch
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn put_then_get_round_trips_at_revision_one() {
        let store = SourceStore::new();
        store.put("main.py", "def f():\n    pass\n".to_string()).unwrap();

        let record = store.get("main.py").unwrap();
        assert_eq!(record.revision, 1);
        assert_eq!(record.text, "def f():\n    pass\n");
    }

    #[test]
    fn patch_commits_new_text_and_bumps_revision() {
        let store = SourceStore::new();
        store.put("main.py", "a\nb\nc\n".to_string()).unwrap();

        let patched = store.patch("main.py", 2, 2, "B", None).unwrap();
        assert_eq!(patched.text, "a\nB\nc\n");
        assert_eq!(patched.revision, 2);
        assert_eq!(store.get("main.py").unwrap().text, "a\nB\nc\n");
    }

    #[test]
    fn repeated_patches_accumulate() {
        let store = SourceStore::new();
        store.put("main.py", "a\nb\nc\n".to_string()).unwrap();

        store.patch("main.py", 1, 1, "A", None).unwrap();
        let patched = store.patch("main.py", 3, 3, "C", None).unwrap();
        assert_eq!(patched.text, "A\nb\nC\n");
        assert_eq!(patched.revision, 3);
    }

    #[test]
    fn failed_patch_leaves_the_record_untouched() {
        let store = SourceStore::new();
        store.put("main.py", "a\nb\n".to_string()).unwrap();

        let err = store.patch("main.py", 0, 1, "x", None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange { .. }));

        let err = store.patch("main.py", 1, 9, "x", None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange { .. }));

        let record = store.get("main.py").unwrap();
        assert_eq!(record.text, "a\nb\n");
        assert_eq!(record.revision, 1);
    }

    #[test]
    fn unknown_file_is_reported() {
        let store = SourceStore::new();
        assert!(matches!(
            store.patch("ghost.py", 1, 1, "x", None),
            Err(StoreError::UnknownFile(_))
        ));
        assert!(matches!(
            store.get("ghost.py"),
            Err(StoreError::UnknownFile(_))
        ));
    }

    #[test]
    fn stale_revision_is_refused() {
        let store = SourceStore::new();
        store.put("main.py", "a\nb\n".to_string()).unwrap();
        store.patch("main.py", 1, 1, "A", None).unwrap();

        let err = store.patch("main.py", 1, 1, "AA", Some(1)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::StaleRevision {
                expected: 1,
                stored: 2
            }
        ));
        assert_eq!(store.get("main.py").unwrap().text, "A\nb\n");
    }

    #[test]
    fn matching_expected_revision_passes() {
        let store = SourceStore::new();
        store.put("main.py", "a\nb\n".to_string()).unwrap();

        let patched = store.patch("main.py", 1, 1, "A", Some(1)).unwrap();
        assert_eq!(patched.revision, 2);
    }

    #[test]
    fn reupload_resets_the_revision() {
        let store = SourceStore::new();
        store.put("main.py", "a\n".to_string()).unwrap();
        store.patch("main.py", 1, 1, "b", None).unwrap();

        assert_eq!(store.put("main.py", "c\n".to_string()).unwrap(), 1);
        let record = store.get("main.py").unwrap();
        assert_eq!(record.text, "c\n");
        assert_eq!(record.revision, 1);
    }

    #[test]
    fn spool_writes_through_and_loads_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let spool = dir.path().to_path_buf();

        let store = SourceStore::with_spool(spool.clone());
        store.put("app.py", "a\nb\n".to_string()).unwrap();
        store.patch("app.py", 2, 2, "B", None).unwrap();
        assert_eq!(fs::read_to_string(spool.join("app.py")).unwrap(), "a\nB\n");

        // a fresh store over the same spool finds the record again
        let reopened = SourceStore::with_spool(spool);
        let record = reopened.get("app.py").unwrap();
        assert_eq!(record.text, "a\nB\n");
        assert_eq!(record.revision, 1);
    }

    #[test]
    fn spool_file_names_are_flattened() {
        assert_eq!(spool_file_name("pkg/mod.py"), "pkg-mod.py");
        assert_eq!(spool_file_name("weird id!.py"), "weird-id-.py");
    }

    #[test]
    fn concurrent_patches_against_one_file_serialize() {
        let store = Arc::new(SourceStore::new());
        store.put("main.py", "0\n".to_string()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for _ in 0..25 {
                    store.patch("main.py", 1, 1, "tick", None).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let record = store.get("main.py").unwrap();
        assert_eq!(record.revision, 101);
        assert_eq!(record.text, "tick\n");
    }
}
