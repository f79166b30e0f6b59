//! Shared constants for integration tests.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Placing shared constants under `tests/common/` avoids creating an
//! additional integration test binary while still allowing reuse via:
//!
//! ```rust
//! #[path = "common/test_constants.rs"]
//! mod test_constants;
//! ```

use std::time::Duration;

/// Bytes in one GiB, the backend's allocation unit.
pub const BYTES_PER_GIB: u64 = 1 << 30;

/// Bytes in one TiB.
pub const BYTES_PER_TIB: u64 = 1 << 40;

/// Readiness polls allowed before provisioning gives up.
pub const POLL_ATTEMPTS: u32 = 10;

/// Delay between readiness polls; short so scenarios run in real time.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2);
