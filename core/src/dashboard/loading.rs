use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Loading indicator shared between the UI and in-flight requests. It stays
/// visible while at least one [`LoadingGuard`] is alive.
#[derive(Debug, Clone, Default)]
pub struct LoadingOverlay {
    active: Arc<AtomicUsize>,
}

impl LoadingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.pending() > 0
    }

    pub fn pending(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Keeps the overlay up until dropped, whichever way the request ends.
#[derive(Debug)]
pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_tracks_live_guards() {
        let overlay = LoadingOverlay::new();
        assert!(!overlay.is_visible());
        let first = overlay.acquire();
        let second = overlay.acquire();
        assert_eq!(overlay.pending(), 2);
        drop(first);
        assert!(overlay.is_visible());
        drop(second);
        assert!(!overlay.is_visible());
    }

    #[test]
    fn guard_is_released_on_unwind() {
        let overlay = LoadingOverlay::new();
        let shared = overlay.clone();
        let outcome = std::panic::catch_unwind(move || {
            let _guard = shared.acquire();
            panic!("request handler failed");
        });
        assert!(outcome.is_err());
        assert_eq!(overlay.pending(), 0);
    }
}
