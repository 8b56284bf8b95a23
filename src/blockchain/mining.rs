use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How many nonces between deadline checks (the flag is checked every time).
const DEADLINE_STRIDE: u64 = 1024;

/// Shared cancellation handle for a mining attempt.
///
/// Clones observe the same flag, so one side can hand a clone to a worker
/// and call `cancel()` from elsewhere. An optional deadline cancels the
/// attempt once it has passed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that trips itself once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Token sharing this one's flag, with a fresh deadline `timeout` from now.
    pub fn deadline_after(&self, timeout: Duration) -> Self {
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.flag.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }

    /// Per-iteration check used by the mining loop. Reading the clock on
    /// every nonce would dominate the hash cost, so the deadline is only
    /// consulted every `DEADLINE_STRIDE` attempts.
    pub(crate) fn should_stop(&self, attempts: u64) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        attempts % DEADLINE_STRIDE == 0 && self.is_cancelled()
    }
}

/// True if `hash` starts with `difficulty` hex zeros.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    hash.len() >= difficulty as usize
        && hash.chars().take(difficulty as usize).all(|c| c == '0')
}
