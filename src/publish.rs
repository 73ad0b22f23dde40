//! Publication channel for named reports.
//!
//! A report is registered under a name together with a snapshot provider.
//! Every [`PublicationChannel::open`] calls the provider once and hands back a
//! [`ReportReader`] over the rendered text, which supports sequential reads and
//! seeking back to the start. Dropping the reader closes it.

use ahash::AHashMap as HashMap;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::{Arc, RwLock as StdRwLock};
use tracing::{debug, info};

use crate::error::{CensusError, PublishError};
use crate::render::render;
use crate::snapshot::Snapshot;

/// Produces a fresh snapshot on every call.
pub type SnapshotProvider = Arc<dyn Fn() -> Result<Snapshot, CensusError> + Send + Sync>;

/// Proof of a registration; pass it back to [`PublicationChannel::unregister`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a Registration leaves the report registered"]
pub struct Registration {
    name: String,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Registry of named, readable reports.
#[derive(Default)]
pub struct PublicationChannel {
    reports: StdRwLock<HashMap<String, SnapshotProvider>>,
}

impl PublicationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under `name`.
    pub fn register(
        &self,
        name: &str,
        provider: SnapshotProvider,
    ) -> Result<Registration, PublishError> {
        if name.is_empty() || name.contains('/') {
            return Err(PublishError::ResourceUnavailable(format!(
                "invalid report name '{}'",
                name
            )));
        }

        let mut reports = self
            .reports
            .write()
            .map_err(|_| PublishError::ResourceUnavailable("registry lock poisoned".into()))?;
        if reports.contains_key(name) {
            return Err(PublishError::ResourceUnavailable(format!(
                "report '{}' already registered",
                name
            )));
        }
        reports.insert(name.to_string(), provider);

        info!("Report '{}' registered", name);
        Ok(Registration {
            name: name.to_string(),
        })
    }

    /// Removes a registration. Readers already open keep their content.
    pub fn unregister(&self, registration: Registration) {
        if let Ok(mut reports) = self.reports.write() {
            reports.remove(&registration.name);
        }
        info!("Report '{}' unregistered", registration.name);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.reports
            .read()
            .map(|reports| reports.contains_key(name))
            .unwrap_or(false)
    }

    /// Generates a fresh snapshot for `name` and opens it for reading.
    pub fn open(&self, name: &str) -> Result<ReportReader, PublishError> {
        let provider = {
            let reports = self
                .reports
                .read()
                .map_err(|_| PublishError::ResourceUnavailable("registry lock poisoned".into()))?;
            reports
                .get(name)
                .cloned()
                .ok_or_else(|| PublishError::NotFound(name.to_string()))?
        };

        // Provider runs outside the lock so concurrent opens do not serialize
        let snapshot = provider()?;
        let text = render(&snapshot);
        debug!(
            "Opened report '{}': {} processes, {} bytes",
            name,
            snapshot.total_count(),
            text.len()
        );
        Ok(ReportReader::new(text))
    }
}

/// Read handle over one rendered report.
#[derive(Debug)]
pub struct ReportReader {
    inner: Cursor<Vec<u8>>,
}

impl ReportReader {
    fn new(text: String) -> Self {
        Self {
            inner: Cursor::new(text.into_bytes()),
        }
    }

    /// Size of the rendered report in bytes.
    pub fn len(&self) -> usize {
        self.inner.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl Read for ReportReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for ReportReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn empty_provider() -> SnapshotProvider {
        Arc::new(|| Ok(Snapshot::default()))
    }

    #[test]
    fn test_register_open_unregister() {
        let channel = PublicationChannel::new();
        let reg = channel.register("psinfo", empty_provider()).unwrap();
        assert_eq!(reg.name(), "psinfo");
        assert!(channel.is_registered("psinfo"));

        let mut text = String::new();
        channel
            .open("psinfo")
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.ends_with("total: 0\n"));

        channel.unregister(reg);
        assert!(!channel.is_registered("psinfo"));
        assert!(matches!(
            channel.open("psinfo"),
            Err(PublishError::NotFound(_))
        ));
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_names() {
        let channel = PublicationChannel::new();
        let _reg = channel.register("psinfo", empty_provider()).unwrap();
        assert!(matches!(
            channel.register("psinfo", empty_provider()),
            Err(PublishError::ResourceUnavailable(_))
        ));
        assert!(channel.register("", empty_provider()).is_err());
        assert!(channel.register("a/b", empty_provider()).is_err());
    }

    #[test]
    fn test_each_open_calls_provider_once() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let channel = PublicationChannel::new();
        let _reg = channel
            .register(
                "psinfo",
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Snapshot::default())
                }),
            )
            .unwrap();

        let mut reader = channel.open("psinfo").unwrap();
        let mut first = Vec::new();
        reader.read_to_end(&mut first).unwrap();
        reader.seek(SeekFrom::Start(0)).unwrap();
        let mut second = Vec::new();
        reader.read_to_end(&mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(channel.open("psinfo").unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_opens_each_get_own_snapshot() {
        const READERS: usize = 8;
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let channel = PublicationChannel::new();
        let _reg = channel
            .register(
                "psinfo",
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Snapshot::default())
                }),
            )
            .unwrap();

        let barrier = std::sync::Barrier::new(READERS);
        let reports: Vec<Vec<u8>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..READERS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        channel.open("psinfo").unwrap().into_bytes()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), READERS as u64);
        assert!(reports.iter().all(|r| r.ends_with(b"total: 0\n")));
    }

    #[test]
    fn test_provider_failure_is_surfaced() {
        let channel = PublicationChannel::new();
        let _reg = channel
            .register(
                "psinfo",
                Arc::new(|| Err(CensusError::ProcessVanished { pid: 1 })),
            )
            .unwrap();
        assert!(matches!(
            channel.open("psinfo"),
            Err(PublishError::Census(_))
        ));
    }
}
