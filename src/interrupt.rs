//! Ctrl-C handling.
//!
//! The first Ctrl-C only raises a flag. Long waits poll it and bail out with
//! [`BboxerError::Interrupted`](crate::BboxerError::Interrupted), so the call
//! stack unwinds normally and scoped resources are dropped. Blocking network
//! calls cannot poll, so a second Ctrl-C ends the process at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::warn;

/// Exit status after a forced quit (128 + SIGINT).
pub const FORCED_EXIT_CODE: i32 = 130;

#[derive(Clone, Debug, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// A flag that is never raised by a signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// A flag raised by Ctrl-C. Falls back to an unwired flag when the
    /// handler cannot be installed.
    pub fn install() -> Self {
        let interrupt = Self::new();
        let handler = interrupt.clone();
        let installed = ctrlc::set_handler(move || {
            if handler.raise() {
                std::process::exit(FORCED_EXIT_CODE);
            }
            eprintln!("Interrupted, stopping. Press Ctrl-C again to quit immediately.");
        });
        if let Err(err) = installed {
            warn!("Failed to install Ctrl+C handler: {err}");
        }
        interrupt
    }

    /// Raises the flag. Returns true if it was already raised.
    pub fn raise(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let observer = interrupt.clone();
        assert!(!observer.is_raised());
        interrupt.raise();
        assert!(observer.is_raised());
    }

    #[test]
    fn test_raise_reports_a_pending_interrupt() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.raise());
        assert!(interrupt.raise());
    }
}
