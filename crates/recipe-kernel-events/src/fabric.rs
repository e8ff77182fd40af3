//! Event fabric abstraction.
//!
//! The fabric delivers topic-tagged JSON payloads to other participants.
//! Delivery is best-effort: a publish with nobody listening still succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::events::{NodeId, RecipeEvent};

/// A message as seen by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// The publishing participant.
    pub from: NodeId,
    /// Topic name.
    pub topic: String,
    /// Structured payload.
    pub payload: Value,
}

impl Envelope {
    /// Decode into a typed recipe event.
    pub fn decode(&self) -> Result<RecipeEvent> {
        RecipeEvent::from_parts(&self.topic, self.payload.clone())
    }
}

/// Publish side of the event fabric.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EventFabric: Send + Sync {
    /// Join the fabric. Idempotent.
    async fn start(&self) -> Result<()>;

    /// Leave the fabric. Idempotent.
    async fn stop(&self) -> Result<()>;

    /// Publish a payload on a topic.
    ///
    /// Fails with `NotStarted` if called outside `start`/`stop`.
    async fn publish(&self, topic: &str, payload: Value) -> Result<()>;

    /// Get the local participant's identity.
    fn local_node_id(&self) -> NodeId;
}

#[async_trait]
impl<F: EventFabric + ?Sized> EventFabric for Arc<F> {
    async fn start(&self) -> Result<()> {
        (**self).start().await
    }

    async fn stop(&self) -> Result<()> {
        (**self).stop().await
    }

    async fn publish(&self, topic: &str, payload: Value) -> Result<()> {
        (**self).publish(topic, payload).await
    }

    fn local_node_id(&self) -> NodeId {
        (**self).local_node_id()
    }
}

/// An in-process fabric for tests and single-node deployments.
///
/// Every fabric created from one hub sees every message published on it.
pub mod memory {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use tokio::sync::broadcast;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use crate::error::EventError;

    /// Shared message bus.
    pub struct MemoryHub {
        sender: broadcast::Sender<Envelope>,
    }

    impl MemoryHub {
        /// Create a hub buffering up to `capacity` messages per subscriber.
        pub fn new(capacity: usize) -> Arc<Self> {
            let (sender, _) = broadcast::channel(capacity.max(1));
            Arc::new(Self { sender })
        }

        /// Create a fabric endpoint publishing as `node_id`.
        pub fn fabric(self: &Arc<Self>, node_id: NodeId) -> MemoryFabric {
            MemoryFabric {
                node_id,
                hub: Arc::clone(self),
                started: AtomicBool::new(false),
            }
        }

        /// Subscribe to everything published from now on.
        pub fn subscribe(&self) -> Subscription {
            Subscription {
                receiver: self.sender.subscribe(),
            }
        }
    }

    /// Publishing endpoint on a [`MemoryHub`].
    pub struct MemoryFabric {
        node_id: NodeId,
        hub: Arc<MemoryHub>,
        started: AtomicBool,
    }

    impl MemoryFabric {
        /// Whether the fabric is between `start` and `stop`.
        pub fn is_started(&self) -> bool {
            self.started.load(Ordering::Acquire)
        }
    }

    #[async_trait]
    impl EventFabric for MemoryFabric {
        async fn start(&self) -> Result<()> {
            self.started.store(true, Ordering::Release);
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.started.store(false, Ordering::Release);
            Ok(())
        }

        async fn publish(&self, topic: &str, payload: Value) -> Result<()> {
            if !self.is_started() {
                return Err(EventError::NotStarted);
            }

            let envelope = Envelope {
                from: self.node_id,
                topic: topic.to_string(),
                payload,
            };

            // No receivers is not an error.
            let delivered = self.hub.sender.send(envelope).unwrap_or(0);
            tracing::trace!(topic, delivered, "published event");
            Ok(())
        }

        fn local_node_id(&self) -> NodeId {
            self.node_id
        }
    }

    /// Receiving end on a [`MemoryHub`].
    pub struct Subscription {
        receiver: broadcast::Receiver<Envelope>,
    }

    impl Subscription {
        /// Wait for the next message.
        pub async fn recv(&mut self) -> Result<Envelope> {
            loop {
                match self.receiver.recv().await {
                    Ok(envelope) => return Ok(envelope),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber lagged, messages dropped");
                    }
                    Err(RecvError::Closed) => return Err(EventError::Closed),
                }
            }
        }

        /// Wait for the next message, up to `timeout`.
        ///
        /// Returns None if the timeout expires first.
        pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<Option<Envelope>> {
            match tokio::time::timeout(timeout, self.recv()).await {
                Ok(result) => result.map(Some),
                Err(_) => Ok(None),
            }
        }

        /// Take a message if one is already queued.
        pub fn try_next(&mut self) -> Option<Envelope> {
            loop {
                match self.receiver.try_recv() {
                    Ok(envelope) => return Some(envelope),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryHub;
    use super::*;
    use crate::error::EventError;
    use crate::events::{topics, DeleteRecipe};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_publish_requires_start() {
        let hub = MemoryHub::new(16);
        let fabric = hub.fabric(NodeId::from_bytes([0xAA; 32]));

        let result = fabric.publish(topics::NEW_RECIPE, json!({})).await;
        assert!(matches!(result, Err(EventError::NotStarted)));

        fabric.start().await.unwrap();
        fabric.publish(topics::NEW_RECIPE, json!({})).await.unwrap();

        fabric.stop().await.unwrap();
        let result = fabric.publish(topics::NEW_RECIPE, json!({})).await;
        assert!(matches!(result, Err(EventError::NotStarted)));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let hub = MemoryHub::new(16);
        let fabric = hub.fabric(NodeId::random());
        fabric.start().await.unwrap();
        assert!(fabric.publish("anything", Value::Null).await.is_ok());
    }

    #[tokio::test]
    async fn test_subscribers_see_messages() {
        let hub = MemoryHub::new(16);
        let node = NodeId::from_bytes([0xBB; 32]);
        let fabric = hub.fabric(node);
        fabric.start().await.unwrap();

        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        let event = RecipeEvent::Delete(DeleteRecipe { id: "r1".into() });
        fabric
            .publish(event.topic(), event.payload().unwrap())
            .await
            .unwrap();

        for sub in [&mut a, &mut b] {
            let envelope = sub
                .recv_timeout(Duration::from_millis(100))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(envelope.from, node);
            assert_eq!(envelope.decode().unwrap(), event);
        }
    }

    #[tokio::test]
    async fn test_recv_timeout_when_idle() {
        let hub = MemoryHub::new(4);
        let mut sub = hub.subscribe();
        let got = sub.recv_timeout(Duration::from_millis(10)).await.unwrap();
        assert!(got.is_none());
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_newest() {
        let hub = MemoryHub::new(2);
        let fabric = hub.fabric(NodeId::random());
        fabric.start().await.unwrap();
        let mut sub = hub.subscribe();

        for i in 0..5 {
            fabric.publish("t", json!(i)).await.unwrap();
        }

        let first = sub.recv().await.unwrap();
        assert_eq!(first.payload, json!(3));
        assert_eq!(sub.try_next().unwrap().payload, json!(4));
    }
}
