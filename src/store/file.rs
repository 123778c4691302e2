//! File-backed collaborators used by the `hr-lifecycle` binary.
//!
//! - [`JsonFileRecordSource`]: a JSON array of employee records.
//! - [`JsonFileDedupStore`]: a JSON object of dedup key to period, guarded
//!   by an exclusive `<path>.lock` file and rewritten atomically (synced
//!   temp file, rename, directory sync) once per write-back.
//! - [`JsonLinesSink`]: appends one JSON event per line.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::engine::{DedupStore, EventSink, RecordSource};
use crate::error::{EngineError, EngineResult};
use crate::models::{DedupKey, EmployeeRecord, LifecycleEvent, ReferencePeriod};

/// Reads the roster from a JSON file holding an array of records.
#[derive(Debug, Clone)]
pub struct JsonFileRecordSource {
    path: PathBuf,
}

impl JsonFileRecordSource {
    /// Creates a source reading `path` on each run.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonFileRecordSource {
    fn read_all(&self, as_of: NaiveDate) -> EngineResult<Vec<EmployeeRecord>> {
        let resource = self.path.display().to_string();
        let content = fs::read_to_string(&self.path)
            .map_err(|e| EngineError::data_access(resource.clone(), e))?;
        let records: Vec<EmployeeRecord> =
            serde_json::from_str(&content).map_err(|e| EngineError::data_access(resource, e))?;

        debug!(path = %self.path.display(), %as_of, records = records.len(), "Read record file");
        Ok(records)
    }
}

/// Default age after which a dedup store lock is presumed abandoned.
pub const DEFAULT_LOCK_LEASE: Duration = Duration::from_secs(6 * 60 * 60);

/// A durable dedup store kept in a single JSON file.
///
/// Opening the store creates `<path>.lock` exclusively; a second opener
/// fails with `DataAccess` until the first is dropped. This serializes
/// runs across processes.
///
/// A lock left behind by a holder that died before releasing it is
/// reclaimed when its recorded process is gone, or once it is older than
/// the lease passed to [`JsonFileDedupStore::open_with_lease`].
#[derive(Debug)]
pub struct JsonFileDedupStore {
    path: PathBuf,
    lock_path: PathBuf,
    entries: BTreeMap<String, ReferencePeriod>,
}

impl JsonFileDedupStore {
    /// Opens the store with [`DEFAULT_LOCK_LEASE`].
    pub fn open(path: impl Into<PathBuf>) -> EngineResult<Self> {
        Self::open_with_lease(path, DEFAULT_LOCK_LEASE)
    }

    /// Acquires the lock and loads existing entries, if the file exists.
    pub fn open_with_lease(path: impl Into<PathBuf>, lease: Duration) -> EngineResult<Self> {
        let path = path.into();
        let lock_path = sibling_with_suffix(&path, "lock");
        let resource = path.display().to_string();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| EngineError::data_access(resource.clone(), e))?;
        }

        acquire_lock(&lock_path, lease)?;

        // Constructed before loading so Drop releases the lock on a load failure.
        let mut store = Self {
            path,
            lock_path,
            entries: BTreeMap::new(),
        };

        match fs::read_to_string(&store.path) {
            Ok(content) => {
                store.entries = serde_json::from_str(&content)
                    .map_err(|e| EngineError::data_access(resource, e))?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(EngineError::data_access(resource, e)),
        }

        info!(path = %store.path.display(), entries = store.entries.len(), "Dedup store opened");
        Ok(store)
    }

    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> EngineResult<()> {
        let resource = self.path.display().to_string();
        let data = serde_json::to_vec_pretty(&self.entries)
            .map_err(|e| EngineError::data_access(resource.clone(), e))?;
        atomic_write(&self.path, &data).map_err(|e| EngineError::data_access(resource, e))
    }

    /// Applies `change` in memory and persists it, rolling back on failure so
    /// memory never runs ahead of disk.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut BTreeMap<String, ReferencePeriod>) -> T,
    ) -> EngineResult<T> {
        let previous = self.entries.clone();
        let outcome = change(&mut self.entries);
        if let Err(err) = self.persist() {
            self.entries = previous;
            return Err(err);
        }
        Ok(outcome)
    }
}

impl DedupStore for JsonFileDedupStore {
    fn get(&self, key: &DedupKey) -> EngineResult<Option<ReferencePeriod>> {
        Ok(self.entries.get(&key.to_string()).cloned())
    }

    fn put(&mut self, key: &DedupKey, period: &ReferencePeriod) -> EngineResult<()> {
        self.commit(|entries| {
            entries.insert(key.to_string(), period.clone());
        })
    }

    fn put_all(&mut self, batch: &[(DedupKey, ReferencePeriod)]) -> EngineResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        self.commit(|entries| {
            for (key, period) in batch {
                entries.insert(key.to_string(), period.clone());
            }
        })
    }

    fn prune_before(&mut self, evaluation_date: NaiveDate) -> EngineResult<usize> {
        let expired = self
            .entries
            .values()
            .filter(|period| period.ends_before(evaluation_date))
            .count();
        if expired == 0 {
            return Ok(0);
        }

        self.commit(|entries| entries.retain(|_, period| !period.ends_before(evaluation_date)))?;
        debug!(path = %self.path.display(), removed = expired, "Pruned expired dedup entries");
        Ok(expired)
    }
}

impl Drop for JsonFileDedupStore {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!(lock = %self.lock_path.display(), error = %e, "Failed to release dedup store lock");
        }
    }
}

/// Appends delivered events to a JSON-lines file.
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    /// Creates a sink appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn delivery_error(&self, error: impl fmt::Display) -> EngineError {
        EngineError::SinkDelivery {
            message: format!("{}: {}", self.path.display(), error),
        }
    }
}

impl EventSink for JsonLinesSink {
    fn deliver(&mut self, events: &[LifecycleEvent]) -> EngineResult<()> {
        let mut buffer = Vec::new();
        for event in events {
            serde_json::to_writer(&mut buffer, event).map_err(|e| self.delivery_error(e))?;
            buffer.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.delivery_error(e))?;
        file.write_all(&buffer).map_err(|e| self.delivery_error(e))?;
        file.sync_all().map_err(|e| self.delivery_error(e))?;

        info!(path = %self.path.display(), events = events.len(), "Delivered event batch");
        Ok(())
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn acquire_lock(lock_path: &Path, lease: Duration) -> EngineResult<()> {
    let resource = lock_path.display().to_string();
    match create_lock_file(lock_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            if !lock_is_stale(lock_path, lease) {
                return Err(EngineError::DataAccess {
                    resource,
                    message: "dedup store is locked by another run".to_string(),
                });
            }

            warn!(lock = %lock_path.display(), "Reclaiming stale dedup store lock");
            match fs::remove_file(lock_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(EngineError::data_access(resource, e)),
            }
            // A single retry; losing the race to another reclaimer means it holds the lock now.
            create_lock_file(lock_path).map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => EngineError::DataAccess {
                    resource: resource.clone(),
                    message: "dedup store is locked by another run".to_string(),
                },
                _ => EngineError::data_access(resource.clone(), e),
            })
        }
        Err(e) => Err(EngineError::data_access(resource, e)),
    }
}

fn create_lock_file(lock_path: &Path) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(lock_path)?;
    writeln!(file, "pid={} acquired_at={}", std::process::id(), Utc::now().to_rfc3339())?;
    file.sync_all()
}

/// Contents of a lock file, as written by [`create_lock_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LockHolder {
    pid: u32,
    acquired_at: DateTime<Utc>,
}

impl LockHolder {
    fn parse(content: &str) -> Option<Self> {
        let mut pid = None;
        let mut acquired_at = None;
        for field in content.split_whitespace() {
            match field.split_once('=') {
                Some(("pid", value)) => pid = value.parse().ok(),
                Some(("acquired_at", value)) => {
                    acquired_at = DateTime::parse_from_rfc3339(value)
                        .ok()
                        .map(|at| at.with_timezone(&Utc))
                }
                _ => {}
            }
        }
        Some(Self {
            pid: pid?,
            acquired_at: acquired_at?,
        })
    }
}

fn lock_is_stale(lock_path: &Path, lease: Duration) -> bool {
    let holder = fs::read_to_string(lock_path)
        .ok()
        .and_then(|content| LockHolder::parse(&content));

    match holder {
        Some(holder) => {
            if process_is_gone(holder.pid) {
                return true;
            }
            let age = Utc::now()
                .signed_duration_since(holder.acquired_at)
                .to_std()
                .unwrap_or_default();
            age >= lease
        }
        // Unreadable or half-written: only the file's age can tell a torn
        // lock from one that is being written right now.
        None => fs::metadata(lock_path)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age >= lease),
    }
}

#[cfg(target_os = "linux")]
fn process_is_gone(pid: u32) -> bool {
    pid != std::process::id()
        && Path::new("/proc/self").exists()
        && !Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_is_gone(_pid: u32) -> bool {
    false
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = sibling_with_suffix(path, "tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::models::{EventKind, Gender, StaffCategory};
    use crate::rules::evaluate_retirement;
    use tempfile::tempdir;

    fn key(employee_id: &str) -> DedupKey {
        DedupKey {
            employee_id: employee_id.to_string(),
            kind: EventKind::ContractExpiryWarning,
            period: ReferencePeriod::day_of(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
        }
    }

    #[test]
    fn test_record_source_reads_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("employees.json");
        fs::write(
            &path,
            r#"[{"id": "emp_001", "full_name": "A", "staff_category": "staff"}]"#,
        )
        .unwrap();

        let records = JsonFileRecordSource::new(&path)
            .read_all(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].staff_category, Some(StaffCategory::Staff));
    }

    #[test]
    fn test_record_source_missing_file_is_data_access_error() {
        let dir = tempdir().unwrap();
        let result = JsonFileRecordSource::new(dir.path().join("missing.json"))
            .read_all(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());

        assert!(matches!(result, Err(EngineError::DataAccess { .. })));
    }

    #[test]
    fn test_dedup_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("dedup.json");

        {
            let mut store = JsonFileDedupStore::open(&path).unwrap();
            store.put(&key("emp_001"), &key("emp_001").period).unwrap();
        }

        let store = JsonFileDedupStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get(&key("emp_001")).unwrap(),
            Some(key("emp_001").period)
        );
        assert_eq!(store.get(&key("emp_002")).unwrap(), None);
    }

    #[test]
    fn test_dedup_store_lock_excludes_second_opener() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");

        let first = JsonFileDedupStore::open(&path).unwrap();
        match JsonFileDedupStore::open(&path) {
            Err(EngineError::DataAccess { message, .. }) => {
                assert_eq!(message, "dedup store is locked by another run");
            }
            other => panic!("Expected lock contention, got {:?}", other),
        }

        drop(first);
        assert!(JsonFileDedupStore::open(&path).is_ok());
    }

    #[test]
    fn test_lock_abandoned_by_crashed_holder_is_reclaimed_after_lease() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");

        let mut crashed = JsonFileDedupStore::open(&path).unwrap();
        crashed.put(&key("emp_001"), &key("emp_001").period).unwrap();
        // Never dropped, as if the process died mid-run.
        std::mem::forget(crashed);

        assert!(matches!(
            JsonFileDedupStore::open(&path),
            Err(EngineError::DataAccess { .. })
        ));

        let store = JsonFileDedupStore::open_with_lease(&path, Duration::ZERO).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_lock_file_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");
        let acquired_at = Utc::now() - chrono::Duration::days(2);
        fs::write(
            dir.path().join("dedup.json.lock"),
            format!("pid={} acquired_at={}\n", std::process::id(), acquired_at.to_rfc3339()),
        )
        .unwrap();

        assert!(JsonFileDedupStore::open(&path).is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_lock_of_dead_process_is_reclaimed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");
        fs::write(
            dir.path().join("dedup.json.lock"),
            format!("pid={} acquired_at={}\n", u32::MAX, Utc::now().to_rfc3339()),
        )
        .unwrap();

        assert!(JsonFileDedupStore::open(&path).is_ok());
    }

    #[test]
    fn test_lock_holder_parse() {
        let holder = LockHolder::parse("pid=4242 acquired_at=2024-03-10T08:00:00+00:00\n").unwrap();
        assert_eq!(holder.pid, 4242);
        assert_eq!(holder.acquired_at.to_rfc3339(), "2024-03-10T08:00:00+00:00");

        assert_eq!(LockHolder::parse(""), None);
        assert_eq!(LockHolder::parse("pid=abc acquired_at=yesterday"), None);
    }

    #[test]
    fn test_put_all_persists_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");

        {
            let mut store = JsonFileDedupStore::open(&path).unwrap();
            let batch: Vec<_> = ["emp_001", "emp_002", "emp_003"]
                .iter()
                .map(|id| (key(id), key(id).period))
                .collect();
            store.put_all(&batch).unwrap();
        }

        let stored: BTreeMap<String, ReferencePeriod> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.len(), 3);
        assert!(!dir.path().join("dedup.json.tmp").exists());
    }

    #[test]
    fn test_prune_drops_past_periods_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");
        let march_10 = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let salary_key = DedupKey {
            employee_id: "emp_002".to_string(),
            kind: EventKind::SalaryRaiseDue,
            period: ReferencePeriod::month_of(march_10),
        };

        {
            let mut store = JsonFileDedupStore::open(&path).unwrap();
            store.put(&key("emp_001"), &key("emp_001").period).unwrap();
            store.put(&salary_key, &salary_key.period).unwrap();

            // Same day: nothing has expired yet.
            assert_eq!(store.prune_before(march_10).unwrap(), 0);

            // Next day: the daily contract key is dead, the monthly one is not.
            let march_11 = march_10.succ_opt().unwrap();
            assert_eq!(store.prune_before(march_11).unwrap(), 1);
            assert_eq!(store.get(&key("emp_001")).unwrap(), None);
            assert!(store.get(&salary_key).unwrap().is_some());
        }

        let store = JsonFileDedupStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_corrupt_store_releases_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            JsonFileDedupStore::open(&path),
            Err(EngineError::DataAccess { .. })
        ));
        assert!(!dir.path().join("dedup.json.lock").exists());
    }

    #[test]
    fn test_jsonl_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let mut sink = JsonLinesSink::new(&path);

        let mut employee = EmployeeRecord::new("emp_001", "Nguyễn Văn A");
        employee.gender = Some(Gender::Male);
        employee.date_of_birth = NaiveDate::from_ymd_opt(1962, 3, 10);
        let event = evaluate_retirement(
            &employee,
            &PolicyConfig::default(),
            NaiveDate::from_ymd_opt(2023, 9, 10).unwrap(),
        )
        .unwrap();

        sink.deliver(std::slice::from_ref(&event)).unwrap();
        sink.deliver(std::slice::from_ref(&event)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: LifecycleEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_jsonl_sink_unwritable_path_is_delivery_error() {
        let dir = tempdir().unwrap();
        let mut sink = JsonLinesSink::new(dir.path().join("no_such_dir").join("outbox.jsonl"));

        assert!(matches!(
            sink.deliver(&[]),
            Err(EngineError::SinkDelivery { .. })
        ));
    }
}
