//! Clocks, timers and entropy for the room runtime.
//!
//! Room logic never touches the system directly. The server binary plugs in
//! the OS clock and entropy; tests plug in a seeded RNG and tokio's paused
//! clock so room codes, session ids and mine layouts replay exactly.
//!
//! # Invariants
//!
//! - `now()` is monotonic
//! - A seeded implementation yields the same `random_bytes()` stream for
//!   the same seed
//! - Two environments never share RNG state

use std::time::{Duration, Instant};

/// Source of time, randomness and delays for room actors.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// 1. `now()` never goes backwards
/// 2. Production `random_bytes()` reads OS entropy: session ids double as
///    reconnect credentials
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic time, used for room age and expiry bookkeeping.
    fn now(&self) -> Instant;

    /// Wall-clock milliseconds since the Unix epoch.
    ///
    /// Stamps chat messages; never used for ordering.
    fn unix_millis(&self) -> u64;

    /// Wait for `duration`.
    ///
    /// Only driver code (room actors, transports) may await this.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fill `buffer` with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Random `u64` for session ids, room code symbols and game seeds.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
