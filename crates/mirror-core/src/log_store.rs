//! Append-only CSV log of detected emotions.
//!
//! The file always starts with the `Timestamp,Detected Emotion` header. The
//! header is written once, when the file is created (or found empty); every
//! later append adds exactly one data row.

use crate::emotion::EmotionLabel;
use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column names, in file order.
pub const HEADER: [&str; 2] = ["Timestamp", "Detected Emotion"];

/// Second-precision timestamp format used in the file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("log I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("log CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("{path} has an unexpected header: {found}")]
    HeaderMismatch { path: String, found: String },
}

/// One detection, as stored in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "Timestamp", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Detected Emotion")]
    pub detected_emotion: String,
}

impl LogRecord {
    pub fn new(timestamp: NaiveDateTime, label: &EmotionLabel) -> Self {
        Self {
            timestamp: timestamp.trunc_subsecs(0),
            detected_emotion: label.as_str().to_string(),
        }
    }

    /// Record stamped with the current local time.
    pub fn now(label: &EmotionLabel) -> Self {
        Self::new(Local::now().naive_local(), label)
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// CSV-backed log store. Single writer; no locking.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file (with header) if needed.
    pub fn append(&self, record: &LogRecord) -> Result<(), LogError> {
        let existing_len = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        if existing_len > 0 {
            self.check_header()?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if existing_len > 0 && !ends_with_newline(&self.path)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(existing_len == 0)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        tracing::debug!(
            path = %self.path.display(),
            emotion = %record.detected_emotion,
            created = existing_len == 0,
            "log record appended"
        );
        Ok(())
    }

    /// Read every record in file order. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<LogRecord>, LogError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::Reader::from_reader(file);
        self.validate_header(reader.headers()?)?;

        reader
            .deserialize::<LogRecord>()
            .map(|row| row.map_err(LogError::from))
            .collect()
    }

    fn check_header(&self) -> Result<(), LogError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        self.validate_header(reader.headers()?)
    }

    fn validate_header(&self, headers: &csv::StringRecord) -> Result<(), LogError> {
        if headers.iter().eq(HEADER.iter().copied()) {
            Ok(())
        } else {
            Err(LogError::HeaderMismatch {
                path: self.path.display().to_string(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            })
        }
    }
}

fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(h: u32, m: u32, s: u32, label: &str) -> LogRecord {
        LogRecord::new(ts(h, m, s), &EmotionLabel::parse(label))
    }

    #[test]
    fn test_first_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("emotion_log.csv"));

        store.append(&record(9, 0, 0, "happy")).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "Timestamp,Detected Emotion\n2026-10-19 09:00:00,happy\n");
    }

    #[test]
    fn test_later_appends_add_rows_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("emotion_log.csv"));

        store.append(&record(9, 0, 0, "happy")).unwrap();
        store.append(&record(9, 0, 5, "sad")).unwrap();
        store.append(&record(9, 1, 0, "neutral")).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.matches("Timestamp,Detected Emotion").count(), 1);
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_round_trip_preserves_order_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("emotion_log.csv"));
        let records = vec![
            record(8, 59, 59, "fear"),
            record(9, 0, 0, "ecstatic"),
            record(9, 0, 0, "contempt"),
            record(10, 30, 1, "disgust"),
        ];
        for r in &records {
            store.append(r).unwrap();
        }
        assert_eq!(store.read_all().unwrap(), records);
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("absent.csv"));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_label_with_comma_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("emotion_log.csv"));
        let r = record(12, 0, 0, "calm, mostly");
        store.append(&r).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![r]);
    }

    #[test]
    fn test_append_to_file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotion_log.csv");
        std::fs::write(&path, "Timestamp,Detected Emotion\n2026-10-19 07:00:00,sad").unwrap();

        let store = LogStore::new(&path);
        store.append(&record(7, 0, 1, "happy")).unwrap();

        let rows = store.read_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].detected_emotion, "sad");
        assert_eq!(rows[1].detected_emotion, "happy");
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotion_log.csv");
        std::fs::write(&path, "").unwrap();

        let store = LogStore::new(&path);
        store.append(&record(7, 0, 0, "angry")).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Timestamp,Detected Emotion\n"));
    }

    #[test]
    fn test_foreign_header_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emotion_log.csv");
        std::fs::write(&path, "when,what\n").unwrap();

        let store = LogStore::new(&path);
        let err = store.append(&record(7, 0, 0, "angry")).unwrap_err();
        assert!(matches!(err, LogError::HeaderMismatch { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "when,what\n");
    }

    #[test]
    fn test_record_truncates_subseconds() {
        let precise = ts(9, 0, 0) + chrono::Duration::milliseconds(750);
        let r = LogRecord::new(precise, &EmotionLabel::Happy);
        assert_eq!(r.timestamp, ts(9, 0, 0));
    }
}
