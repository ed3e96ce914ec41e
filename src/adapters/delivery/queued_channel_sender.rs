//! QueuedChannelSender - ordered, paced, fire-and-forget delivery.
//!
//! Each destination gets its own FIFO queue drained by a single worker task,
//! so replies to one conversation go out in the order they were produced
//! while different destinations proceed independently. A shared semaphore
//! caps concurrent provider calls. Workers exit after an idle period and are
//! respawned on the next message.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time;

use crate::domain::conversation::MessageBatch;
use crate::domain::foundation::ChannelAddress;
use crate::ports::{ChannelSender, MessageTransport, OutboundEnvelope};

/// Configuration for the QueuedChannelSender.
#[derive(Debug, Clone)]
pub struct QueuedChannelSenderConfig {
    /// Pause after each message to the same destination.
    pub pacing: Duration,

    /// Maximum provider calls in flight across all destinations.
    pub max_concurrent_sends: usize,

    /// How long an empty queue keeps its worker alive.
    pub queue_idle_timeout: Duration,
}

impl Default for QueuedChannelSenderConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(1000),
            max_concurrent_sends: 8,
            queue_idle_timeout: Duration::from_secs(30),
        }
    }
}

type QueueMap = HashMap<ChannelAddress, mpsc::UnboundedSender<OutboundEnvelope>>;

struct Shared {
    transport: Arc<dyn MessageTransport>,
    permits: Semaphore,
    queues: Mutex<QueueMap>,
    config: QueuedChannelSenderConfig,
}

/// ChannelSender backed by per-destination queues.
///
/// Must be used from within a Tokio runtime; workers are spawned on demand.
#[derive(Clone)]
pub struct QueuedChannelSender {
    shared: Arc<Shared>,
}

impl QueuedChannelSender {
    pub fn new(transport: Arc<dyn MessageTransport>, config: QueuedChannelSenderConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                permits: Semaphore::new(config.max_concurrent_sends.max(1)),
                queues: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Number of destinations with a live worker.
    pub fn active_queues(&self) -> usize {
        self.shared
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn spawn_worker(
        &self,
        to: &ChannelAddress,
    ) -> mpsc::UnboundedSender<OutboundEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::clone(&self.shared);
        let destination = to.clone();
        tokio::spawn(async move { drain(shared, destination, rx).await });
        tx
    }
}

impl ChannelSender for QueuedChannelSender {
    fn send_batch(&self, from: &ChannelAddress, to: &ChannelAddress, batch: MessageBatch) {
        let mut queues = self
            .shared
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for message in batch {
            if message.is_blank() {
                tracing::debug!(to = %to, "skipping blank message");
                continue;
            }

            let envelope = OutboundEnvelope {
                from: from.clone(),
                to: to.clone(),
                message,
            };

            let queue = queues
                .entry(to.clone())
                .or_insert_with(|| self.spawn_worker(to));

            if let Err(mpsc::error::SendError(envelope)) = queue.send(envelope) {
                // Worker is gone; start a fresh one.
                let fresh = self.spawn_worker(to);
                if fresh.send(envelope).is_err() {
                    tracing::warn!(to = %to, "delivery queue closed, message dropped");
                }
                queues.insert(to.clone(), fresh);
            }
        }
    }
}

async fn drain(
    shared: Arc<Shared>,
    destination: ChannelAddress,
    mut rx: mpsc::UnboundedReceiver<OutboundEnvelope>,
) {
    loop {
        let envelope = match time::timeout(shared.config.queue_idle_timeout, rx.recv()).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return,
            Err(_) => {
                // Recheck under the map lock so nothing is enqueued between
                // the last look and the removal.
                let mut queues = shared.queues.lock().unwrap_or_else(PoisonError::into_inner);
                match rx.try_recv() {
                    Ok(envelope) => envelope,
                    Err(_) => {
                        queues.remove(&destination);
                        tracing::debug!(to = %destination, "delivery queue idle, worker exiting");
                        return;
                    }
                }
            }
        };

        deliver(&shared, &envelope).await;
        time::sleep(shared.config.pacing).await;
    }
}

async fn deliver(shared: &Shared, envelope: &OutboundEnvelope) {
    let Ok(_permit) = shared.permits.acquire().await else {
        return;
    };

    match shared.transport.send(envelope).await {
        Ok(receipt) => tracing::debug!(
            to = %envelope.to,
            provider_id = receipt.provider_id.as_deref().unwrap_or("-"),
            "message delivered"
        ),
        Err(e) => tracing::warn!(
            to = %envelope.to,
            error = %e,
            "message delivery failed, dropping"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::OutboundMessage;
    use crate::ports::{DeliveryError, DeliveryReceipt};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ─────────────────────────────────────────────────────────────────────
    // Test doubles
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct RecordingTransport {
        delivered: Mutex<Vec<OutboundEnvelope>>,
        fail_body: Option<&'static str>,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RecordingTransport {
        fn delivered(&self) -> Vec<OutboundEnvelope> {
            self.delivered.lock().unwrap().clone()
        }

        fn bodies_to(&self, to: &str) -> Vec<String> {
            self.delivered()
                .into_iter()
                .filter(|e| e.to.as_str() == to)
                .map(|e| e.message.body)
                .collect()
        }
    }

    #[async_trait]
    impl MessageTransport for RecordingTransport {
        async fn send(&self, envelope: &OutboundEnvelope) -> Result<DeliveryReceipt, DeliveryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_body == Some(envelope.message.body.as_str()) {
                return Err(DeliveryError::Rejected {
                    status: 400,
                    message: "invalid number".to_string(),
                });
            }
            self.delivered.lock().unwrap().push(envelope.clone());
            Ok(DeliveryReceipt { provider_id: None })
        }
    }

    fn address(value: &str) -> ChannelAddress {
        ChannelAddress::new(value).unwrap()
    }

    fn fast_config() -> QueuedChannelSenderConfig {
        QueuedChannelSenderConfig {
            pacing: Duration::from_millis(1),
            max_concurrent_sends: 8,
            queue_idle_timeout: Duration::from_millis(50),
        }
    }

    fn batch(bodies: &[&str]) -> MessageBatch {
        bodies.iter().map(|b| OutboundMessage::text(*b)).collect()
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tests
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn delivers_batch_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = QueuedChannelSender::new(transport.clone(), fast_config());

        sender.send_batch(&address("+100"), &address("+200"), batch(&["a", "b", "c"]));
        sender.send_batch(&address("+100"), &address("+200"), batch(&["d"]));

        wait_until(|| transport.delivered().len() == 4).await;
        assert_eq!(transport.bodies_to("+200"), vec!["a", "b", "c", "d"]);
        assert!(transport.delivered().iter().all(|e| e.from == address("+100")));
    }

    #[tokio::test]
    async fn blank_messages_are_not_sent() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = QueuedChannelSender::new(transport.clone(), fast_config());
        let mut messages = batch(&["a"]);
        messages.push(OutboundMessage::with_media("", "https://desk.example.com/r.pdf"));

        sender.send_batch(&address("+1"), &address("+2"), messages);
        sender.send_batch(&address("+1"), &address("+3"), MessageBatch::new());

        wait_until(|| transport.delivered().len() == 2).await;
        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.delivered().len(), 2);
        assert!(transport.bodies_to("+3").is_empty());
    }

    #[tokio::test]
    async fn failure_is_dropped_and_queue_continues() {
        let transport = Arc::new(RecordingTransport {
            fail_body: Some("b"),
            ..Default::default()
        });
        let sender = QueuedChannelSender::new(transport.clone(), fast_config());

        sender.send_batch(&address("+1"), &address("+2"), batch(&["a", "b", "c"]));

        wait_until(|| transport.delivered().len() == 2).await;
        assert_eq!(transport.bodies_to("+2"), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn destinations_are_independent_and_ordered() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = QueuedChannelSender::new(transport.clone(), fast_config());

        for i in 0..5 {
            sender.send_batch(&address("+1"), &address("+2"), batch(&[format!("x{i}").as_str()]));
            sender.send_batch(&address("+1"), &address("+3"), batch(&[format!("y{i}").as_str()]));
        }

        wait_until(|| transport.delivered().len() == 10).await;
        assert_eq!(transport.bodies_to("+2"), vec!["x0", "x1", "x2", "x3", "x4"]);
        assert_eq!(transport.bodies_to("+3"), vec!["y0", "y1", "y2", "y3", "y4"]);
    }

    #[tokio::test]
    async fn concurrent_sends_are_bounded() {
        let transport = Arc::new(RecordingTransport {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        let config = QueuedChannelSenderConfig {
            max_concurrent_sends: 2,
            ..fast_config()
        };
        let sender = QueuedChannelSender::new(transport.clone(), config);

        for i in 0..6 {
            sender.send_batch(&address("+1"), &address(&format!("+9{i}")), batch(&["m"]));
        }

        wait_until(|| transport.delivered().len() == 6).await;
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn idle_workers_exit_and_respawn() {
        let transport = Arc::new(RecordingTransport::default());
        let sender = QueuedChannelSender::new(transport.clone(), fast_config());

        sender.send_batch(&address("+1"), &address("+2"), batch(&["a"]));
        assert_eq!(sender.active_queues(), 1);

        wait_until(|| sender.active_queues() == 0).await;

        sender.send_batch(&address("+1"), &address("+2"), batch(&["b"]));
        wait_until(|| transport.delivered().len() == 2).await;
        assert_eq!(transport.bodies_to("+2"), vec!["a", "b"]);
    }
}
