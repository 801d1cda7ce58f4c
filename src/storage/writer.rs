//! Visit records and dataset persistence

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Telemetry for one URL visit attempt. Created exactly once per attempt,
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub url: String,
    /// HTTP status of the main document, or -1 when no response was obtained
    pub status_code: i64,
    /// Wall-clock seconds for the full simulated visit, millisecond precision
    pub response_time: f64,
    /// Count of successfully performed actions
    pub interactions: u32,
    /// ISO-8601 UTC timestamp taken at record creation
    pub timestamp: String,
}

impl VisitRecord {
    pub fn new(
        url: impl Into<String>,
        status_code: Option<i64>,
        elapsed: Duration,
        interactions: u32,
    ) -> Self {
        Self {
            url: url.into(),
            status_code: status_code.unwrap_or(-1),
            response_time: round_to_millis(elapsed.as_secs_f64()),
            interactions,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

fn round_to_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Accumulates visit records in memory and persists them as a single JSON
/// document at the end of the run.
///
/// Appends are safe from concurrent workers; `flush` is called once after
/// all workers have joined.
pub struct DatasetWriter {
    output_path: PathBuf,
    records: Mutex<Vec<VisitRecord>>,
}

impl DatasetWriter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Append a record. Records appear in completion order, which under
    /// concurrent workers is unrelated to input order.
    pub fn add_record(&self, record: VisitRecord) {
        self.records.lock().push(record);
    }

    /// Number of records accumulated so far
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Snapshot of the accumulated records, in insertion order
    pub fn records(&self) -> Vec<VisitRecord> {
        self.records.lock().clone()
    }

    /// Materialize the dataset as a pretty-printed JSON array.
    ///
    /// Parent directories are created as needed. The document is written to a
    /// temporary sibling file and renamed into place, so readers never see a
    /// partial dataset. Flushing twice with no intervening append produces
    /// byte-identical output.
    pub fn flush(&self) -> anyhow::Result<()> {
        let json = {
            let records = self.records.lock();
            serde_json::to_string_pretty(&*records)?
        };

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut tmp_name = self
            .output_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "dataset.json".into());
        tmp_name.push(".tmp");
        let tmp_path = self.output_path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.output_path)?;

        info!(
            "Flushed {} records to {}",
            self.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample_record(url: &str) -> VisitRecord {
        VisitRecord::new(url, Some(200), Duration::from_millis(1234), 5)
    }

    #[test]
    fn record_uses_sentinel_when_no_response() {
        let record = VisitRecord::new("https://a.test", None, Duration::from_secs(30), 0);
        assert_eq!(record.status_code, -1);
        assert_eq!(record.interactions, 0);
    }

    #[test]
    fn response_time_is_rounded_to_millisecond_precision() {
        let record = VisitRecord::new(
            "https://a.test",
            Some(200),
            Duration::from_nanos(1_234_567_890),
            1,
        );
        assert_eq!(record.response_time, 1.235);
    }

    #[test]
    fn record_timestamp_is_rfc3339() {
        let record = sample_record("https://a.test");
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn flush_writes_json_array_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        let writer = DatasetWriter::new(&path);
        writer.add_record(sample_record("https://a.test"));
        writer.add_record(sample_record("https://b.test"));

        writer.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<VisitRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].url, "https://a.test");
        assert_eq!(parsed[1].url, "https://b.test");
    }

    #[test]
    fn flush_is_idempotent_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let writer = DatasetWriter::new(&path);
        writer.add_record(sample_record("https://a.test"));

        writer.flush().unwrap();
        let first = std::fs::read(&path).unwrap();
        writer.flush().unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_writer_flushes_an_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        DatasetWriter::new(&path).flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let writer = Arc::new(DatasetWriter::new("unused.json"));
        let mut tasks = Vec::new();
        for worker in 0..8 {
            let writer = writer.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    writer.add_record(sample_record(&format!("https://w{worker}-{i}.test")));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(writer.len(), 400);
    }
}
