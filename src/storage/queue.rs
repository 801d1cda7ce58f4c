//! URL queue and input-list loading

use std::collections::VecDeque;
use std::path::Path;

use parking_lot::Mutex;

/// Load URLs from a plain-text file, one per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn load_urls_from_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Repeat the URL list `sessions` times so each session iterates the full
/// list. A factor below 1 is treated as 1.
pub fn expand_sessions(urls: &[String], sessions: u32) -> Vec<String> {
    let sessions = sessions.max(1) as usize;
    let mut expanded = Vec::with_capacity(urls.len() * sessions);
    for _ in 0..sessions {
        expanded.extend_from_slice(urls);
    }
    expanded
}

/// Concurrent-safe FIFO of pending URLs.
///
/// Pre-loaded at construction; workers drain it with [`try_dequeue`]
/// (non-blocking) and treat `None` as the authoritative exhaustion signal.
/// [`is_empty`] is advisory only — another worker may dequeue between the
/// check and the next call.
///
/// [`try_dequeue`]: UrlQueue::try_dequeue
/// [`is_empty`]: UrlQueue::is_empty
pub struct UrlQueue {
    items: Mutex<VecDeque<String>>,
}

impl UrlQueue {
    /// Create a queue pre-loaded with the given URLs, in order.
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            items: Mutex::new(urls.into()),
        }
    }

    /// Pop the next URL, or `None` if the queue is exhausted. Never blocks,
    /// never hands the same item to two callers.
    pub fn try_dequeue(&self) -> Option<String> {
        self.items.lock().pop_front()
    }

    /// Advisory emptiness check
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Number of URLs still pending
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    #[test]
    fn load_skips_blank_lines_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://a.test").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "https://b.test").unwrap();

        let urls = load_urls_from_file(file.path()).unwrap();
        assert_eq!(urls, vec!["https://a.test", "https://b.test"]);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(load_urls_from_file(Path::new("/nonexistent/urls.txt")).is_err());
    }

    #[test]
    fn expand_repeats_full_list_per_session() {
        let urls = vec!["https://a.test".to_string(), "https://b.test".to_string()];
        let expanded = expand_sessions(&urls, 2);
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded.iter().filter(|u| *u == "https://a.test").count(), 2);
        assert_eq!(expanded.iter().filter(|u| *u == "https://b.test").count(), 2);
    }

    #[test]
    fn expand_treats_zero_as_single_session() {
        let urls = vec!["https://a.test".to_string()];
        assert_eq!(expand_sessions(&urls, 0), urls);
    }

    #[test]
    fn dequeue_is_fifo_and_exhausts() {
        let queue = UrlQueue::new(vec!["a".into(), "b".into()]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_dequeue().as_deref(), Some("a"));
        assert_eq!(queue.try_dequeue().as_deref(), Some("b"));
        assert_eq!(queue.try_dequeue(), None);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn concurrent_dequeue_never_duplicates_or_drops() {
        let total = 500;
        let urls: Vec<String> = (0..total).map(|i| format!("https://site-{i}.test")).collect();
        let queue = Arc::new(UrlQueue::new(urls.clone()));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let queue = queue.clone();
            let seen = seen.clone();
            tasks.push(tokio::spawn(async move {
                while let Some(url) = queue.try_dequeue() {
                    seen.lock().push(url);
                    tokio::task::yield_now().await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let mut seen = Arc::try_unwrap(seen).unwrap().into_inner();
        seen.sort();
        let mut expected = urls;
        expected.sort();
        assert_eq!(seen, expected);
    }
}
