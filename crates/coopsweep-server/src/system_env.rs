//! `Environment` backed by the operating system.
//!
//! Session ids, room codes and game seeds all draw from OS entropy; expiry
//! timers run on the tokio clock.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use coopsweep_core::Environment;

/// Environment used by the `coopsweep-server` binary.
///
/// Session ids double as reconnect credentials, so randomness must never
/// come from a seeded generator here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_millis(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since_epoch) => u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX),
            Err(_) => 0,
        }
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        if let Err(e) = getrandom::fill(buffer) {
            // Unsupported platform; ids degrade to zeroes rather than abort.
            tracing::error!(len = buffer.len(), "getrandom failed: {}", e);
            buffer.fill(0);
        }
    }
}
