//! Best-effort notification with bounded retry.
//!
//! A failed publish never fails the lifecycle operation that produced it;
//! the outcome is logged and handed back for inspection.

use std::sync::Arc;
use std::time::Duration;

use crate::events::RecipeEvent;
use crate::fabric::EventFabric;

/// Retry schedule for publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Result of a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Published successfully.
    Delivered { attempts: u32 },
    /// Gave up after exhausting the retry policy.
    Failed { attempts: u32, error: String },
}

impl NotifyOutcome {
    /// Whether the event reached the fabric.
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered { .. })
    }
}

/// Publishes recipe events on a fabric.
pub struct Notifier<F: EventFabric> {
    fabric: Arc<F>,
    policy: RetryPolicy,
}

impl<F: EventFabric> Clone for Notifier<F> {
    fn clone(&self) -> Self {
        Self {
            fabric: Arc::clone(&self.fabric),
            policy: self.policy.clone(),
        }
    }
}

impl<F: EventFabric + 'static> Notifier<F> {
    /// Create a notifier over `fabric`.
    pub fn new(fabric: Arc<F>, policy: RetryPolicy) -> Self {
        Self { fabric, policy }
    }

    /// Get the underlying fabric.
    pub fn fabric(&self) -> &Arc<F> {
        &self.fabric
    }

    /// Publish `event`, retrying per the policy.
    pub async fn notify(&self, event: &RecipeEvent) -> NotifyOutcome {
        let topic = event.topic();
        let payload = match event.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(topic, id = %event.id(), error = %e, "could not encode event");
                return NotifyOutcome::Failed {
                    attempts: 0,
                    error: e.to_string(),
                };
            }
        };

        let attempts = self.policy.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.fabric.publish(topic, payload.clone()).await {
                Ok(()) => {
                    tracing::debug!(topic, id = %event.id(), attempt, "event published");
                    return NotifyOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    tracing::debug!(topic, attempt, error = %e, "publish attempt failed");
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }

        tracing::warn!(
            topic,
            id = %event.id(),
            attempts,
            error = %last_error,
            "giving up on event"
        );
        NotifyOutcome::Failed {
            attempts,
            error: last_error,
        }
    }

    /// Publish on a background task.
    pub fn notify_in_background(&self, event: RecipeEvent) -> tokio::task::JoinHandle<NotifyOutcome> {
        let notifier = self.clone();
        tokio::spawn(async move { notifier.notify(&event).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EventError, Result};
    use crate::events::{DeleteRecipe, NodeId};
    use crate::fabric::memory::MemoryHub;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` publishes.
    struct Stubborn {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl EventFabric for Stubborn {
        async fn start(&self) -> Result<()> {
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            Ok(())
        }

        async fn publish(&self, _topic: &str, _payload: Value) -> Result<()> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(EventError::Transport("down".into()))
            } else {
                Ok(())
            }
        }

        fn local_node_id(&self) -> NodeId {
            NodeId::from_bytes([0; 32])
        }
    }

    fn event() -> RecipeEvent {
        RecipeEvent::Delete(DeleteRecipe { id: "r1".into() })
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(50));
        assert_eq!(policy.delay_after(2), Duration::from_millis(100));
        assert_eq!(policy.delay_after(3), Duration::from_millis(200));
        assert_eq!(policy.delay_after(30), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_retries_then_delivers() {
        let fabric = Arc::new(Stubborn {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let notifier = Notifier::new(Arc::clone(&fabric), fast(3));

        let outcome = notifier.notify(&event()).await;
        assert_eq!(outcome, NotifyOutcome::Delivered { attempts: 3 });
        assert_eq!(fabric.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_without_error() {
        let fabric = Arc::new(Stubborn {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let notifier = Notifier::new(Arc::clone(&fabric), fast(2));

        let outcome = notifier.notify(&event()).await;
        assert!(matches!(outcome, NotifyOutcome::Failed { attempts: 2, .. }));
        assert_eq!(fabric.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unstarted_fabric_is_absorbed() {
        let hub = MemoryHub::new(4);
        let notifier = Notifier::new(Arc::new(hub.fabric(NodeId::random())), RetryPolicy::none());

        let outcome = notifier.notify(&event()).await;
        assert!(!outcome.is_delivered());
    }

    #[tokio::test]
    async fn test_background_delivery() {
        let hub = MemoryHub::new(4);
        let fabric = Arc::new(hub.fabric(NodeId::random()));
        fabric.start().await.unwrap();
        let mut sub = hub.subscribe();

        let notifier = Notifier::new(fabric, RetryPolicy::default());
        let outcome = notifier.notify_in_background(event()).await.unwrap();
        assert!(outcome.is_delivered());
        assert_eq!(sub.recv().await.unwrap().decode().unwrap(), event());
    }
}
