//! Cancellable quiet-period timer for search-as-you-type inputs
//!
//! Every call takes a new generation number and sleeps; only the call whose
//! generation is still current when it wakes up lets its value through.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dioxus::prelude::*;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Resolves to `Some(value)` if no other call or cancel happened during
    /// the quiet period, `None` otherwise.
    pub async fn call<T>(&self, value: T) -> Option<T> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        crate::utils::sleep(self.delay).await;
        if self.generation.load(Ordering::SeqCst) == ticket {
            Some(value)
        } else {
            None
        }
    }

    /// Drops whatever call is pending
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Follows `source` with a lag: the returned signal only takes a value once
/// `source` has stayed on it for `delay`. Pending updates are cancelled when
/// the component unmounts.
pub fn use_debounced<T>(source: Signal<T>, delay: Duration) -> Signal<T>
where
    T: Clone + PartialEq + 'static,
{
    let initial = source.peek().clone();
    let mut settled = use_signal(move || initial);
    let debouncer = use_hook(|| Debouncer::new(delay));

    let on_drop = debouncer.clone();
    use_drop(move || on_drop.cancel());

    use_effect(move || {
        let value = source.read().clone();
        let debouncer = debouncer.clone();
        spawn(async move {
            if let Some(value) = debouncer.call(value).await {
                if *settled.peek() != value {
                    settled.set(value);
                }
            }
        });
    });

    settled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_with_last_value() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        let mut pending = Vec::new();
        for keystroke in ["a", "an", "ana", "ana@", "ana@x"] {
            let debouncer = debouncer.clone();
            pending.push(tokio::spawn(async move { debouncer.call(keystroke).await }));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let mut fired = Vec::new();
        for handle in pending {
            if let Some(value) = handle.await.unwrap() {
                fired.push(value);
            }
        }
        assert_eq!(fired, vec!["ana@x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_fire() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        assert_eq!(debouncer.call(1).await, Some(1));
        assert_eq!(debouncer.call(2).await, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_call() {
        let debouncer = Debouncer::new(Duration::from_millis(400));
        let pending = {
            let debouncer = debouncer.clone();
            tokio::spawn(async move { debouncer.call("late").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        debouncer.cancel();
        assert_eq!(pending.await.unwrap(), None);
    }
}
