//! What a successful activation writes to the log at each level.

use std::io;
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use keygate_core::{DurationHours, KeyId, KeyRecord};
use keygate_state::{ActivationEngine, KeyStore, MemoryKeyStore, Verdict};
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

const HWID: &str = "pc-7f3a9c-serial";

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Activate a fresh key with a subscriber at `level` and return the log.
async fn activation_log(level: Level) -> String {
    let out = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(out.clone())
        .with_max_level(level)
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let now = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
    let store: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::new());
    let id = KeyId::new("SWIFT-log").unwrap();
    store
        .insert(KeyRecord::new(id.clone(), DurationHours::new(6).unwrap(), "Free Key", now))
        .await
        .unwrap();

    let verdict = ActivationEngine::new(store)
        .verify(id.as_str(), HWID, now)
        .await
        .unwrap();
    assert!(matches!(verdict, Verdict::Activated { .. }));
    out.text()
}

#[tokio::test]
async fn info_log_omits_hwid() {
    let log = activation_log(Level::INFO).await;
    assert!(log.contains("key activated"), "log was: {log}");
    assert!(log.contains("SWIFT-log"));
    assert!(!log.contains(HWID), "hwid leaked at info: {log}");
}

#[tokio::test]
async fn debug_log_names_hwid() {
    let log = activation_log(Level::DEBUG).await;
    assert!(log.contains(HWID), "log was: {log}");
}
