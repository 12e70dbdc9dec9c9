use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::model::date_key;

const DRAFT_EXTENSION: &str = "json";
const DRAFT_TMP_EXTENSION: &str = "json.tmp";

/// Per-date autosave record as persisted on disk. Field names follow the
/// shared draft layout so records survive a client-implementation swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub document: String,
    pub deleted_ids: Vec<String>,
    /// Epoch milliseconds at the moment the draft was written.
    pub timestamp: i64,
}

/// File-backed draft persistence, one record per calendar date under
/// `<namespace>.draft.<YYYY-MM-DD>.json`.
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
    namespace: String,
}

impl DraftStore {
    pub fn new(dir: PathBuf, namespace: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating draft directory {}", dir.display()))?;
        Ok(Self {
            dir,
            namespace: namespace.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, date: Date, document: &str, deleted_ids: &[String]) -> Result<()> {
        let record = DraftRecord {
            document: document.to_string(),
            deleted_ids: deleted_ids.to_vec(),
            timestamp: epoch_millis(OffsetDateTime::now_utc()),
        };
        let json = serde_json::to_vec_pretty(&record).context("serialising draft record")?;
        let final_path = self.record_path(date);
        let tmp_path = final_path.with_extension(DRAFT_TMP_EXTENSION);
        fs::write(&tmp_path, &json)
            .with_context(|| format!("writing temporary draft {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("atomically persisting draft {}", final_path.display()))?;
        Ok(())
    }

    /// Returns the record for `date`, or None when absent or malformed.
    /// Malformed records are deleted on the way out rather than surfaced.
    pub fn read(&self, date: Date) -> Option<DraftRecord> {
        let path = self.record_path(date);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(?err, "failed to read draft {}", path.display());
                return None;
            }
        };
        match serde_json::from_slice::<DraftRecord>(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(?err, "discarding corrupt draft {}", path.display());
                if let Err(err) = remove_record(&path) {
                    tracing::warn!(?err, "failed to remove corrupt draft");
                }
                None
            }
        }
    }

    pub fn clear(&self, date: Date) -> Result<()> {
        remove_record(&self.record_path(date))
    }

    fn record_path(&self, date: Date) -> PathBuf {
        self.dir.join(format!(
            "{}.draft.{}.{DRAFT_EXTENSION}",
            self.namespace,
            date_key(date)
        ))
    }
}

fn remove_record(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing draft {}", path.display())),
    }
}

fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::date;

    fn store(temp: &TempDir) -> DraftStore {
        DraftStore::new(temp.path().join("drafts"), "bujo").expect("store")
    }

    #[test]
    fn save_read_clear_round_trip() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store(&temp);
        let day = date!(2026 - 08 - 29);

        store.save(day, ". Buy milk\n- A note", &["e-1".to_string()])?;
        let record = store.read(day).expect("record present");
        assert_eq!(record.document, ". Buy milk\n- A note");
        assert_eq!(record.deleted_ids, vec!["e-1".to_string()]);
        assert!(record.timestamp > 0);

        store.clear(day)?;
        assert!(store.read(day).is_none());
        // Clearing an already-absent record is not an error.
        store.clear(day)?;
        Ok(())
    }

    #[test]
    fn records_are_scoped_per_date() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store(&temp);
        store.save(date!(2026 - 08 - 29), "today", &[])?;
        store.save(date!(2026 - 08 - 30), "tomorrow", &[])?;

        assert_eq!(store.read(date!(2026 - 08 - 29)).unwrap().document, "today");
        assert_eq!(
            store.read(date!(2026 - 08 - 30)).unwrap().document,
            "tomorrow"
        );
        Ok(())
    }

    #[test]
    fn corrupt_record_is_deleted_and_reported_absent() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store(&temp);
        let day = date!(2026 - 08 - 29);
        let path = store.dir().join("bujo.draft.2026-08-29.json");
        fs::write(&path, b"{not json")?;

        assert!(store.read(day).is_none());
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn save_overwrites_previous_record() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store(&temp);
        let day = date!(2026 - 08 - 29);
        store.save(day, "first", &[])?;
        store.save(day, "second", &["e-2".to_string()])?;

        let record = store.read(day).unwrap();
        assert_eq!(record.document, "second");
        assert_eq!(record.deleted_ids, vec!["e-2".to_string()]);
        Ok(())
    }
}
