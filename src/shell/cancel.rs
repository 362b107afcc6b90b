//! Cooperative cancellation shared by every wait loop and subprocess.
//!
//! A [`CancelToken`] is a cheap, cloneable flag. Long waits never block
//! unconditionally: they poll the token at a bounded interval and release
//! (killing any child process they own) once it is raised.
//!
//! Tokens created with [`CancelToken::with_signal_handlers`] also observe
//! SIGINT/SIGTERM on unix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How often wait loops re-check cancellation and child status.
pub const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Set from the signal handler. Only ever stored to, never cleared.
static SIGNALLED: AtomicBool = AtomicBool::new(false);

/// Cancellation flag shared between a coordinator and its workers.
///
/// Writers store with `Release`; readers load with `Acquire`, so work done
/// before `cancel()` is visible to whoever observes the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
    watch_signals: bool,
}

impl CancelToken {
    /// Create a token that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that is also cancelled by SIGINT/SIGTERM.
    pub fn with_signal_handlers() -> Self {
        install_signal_handlers();
        Self {
            watch_signals: true,
            ..Self::default()
        }
    }

    /// Derive a token that is cancelled with this one, but can also be
    /// cancelled on its own without affecting the parent.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
            watch_signals: false,
        }
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether this token, a parent, or a watched signal asked to stop.
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Acquire) {
            return true;
        }
        if self.watch_signals && SIGNALLED.load(Ordering::Acquire) {
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

#[cfg(unix)]
extern "C" fn on_signal(_signal: libc::c_int) {
    SIGNALLED.store(true, Ordering::Release);
}

#[cfg(unix)]
fn install_signal_handlers() {
    static INSTALL: std::sync::Once = std::sync::Once::new();
    INSTALL.call_once(|| {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only performs an atomic store, which is
        // async-signal-safe, and it is installed once for the process.
        unsafe {
            libc::signal(libc::SIGINT, handler);
            libc::signal(libc::SIGTERM, handler);
        }
        tracing::debug!("Installed SIGINT/SIGTERM handlers");
    });
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_not_cancelled() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn child_follows_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        assert!(!child.is_cancelled());
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn child_cancel_does_not_reach_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn cancel_crosses_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
