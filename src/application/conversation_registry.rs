//! ConversationRegistry - live conversations keyed by sender address.
//!
//! The registry is the only state shared between webhook requests. Lookups
//! take a read lock on the map; first contact upgrades to the write lock and
//! re-checks, so concurrent first messages from one address create exactly
//! one context. Each context sits behind its own mutex, which serialises the
//! turns of one conversation without blocking any other.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::time;

use crate::domain::conversation::{ContinuationMode, ConversationContext};
use crate::domain::foundation::{ChannelAddress, Timestamp};
use crate::ports::ArtifactStorage;

/// Shared handle to one conversation.
pub type SharedContext = Arc<Mutex<ConversationContext>>;

/// Map of live conversations.
pub struct ConversationRegistry {
    conversations: RwLock<HashMap<ChannelAddress, SharedContext>>,
    mode: ContinuationMode,
}

impl ConversationRegistry {
    pub fn new(mode: ContinuationMode) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            mode,
        }
    }

    /// Returns the conversation for `identity`, creating it on first contact.
    ///
    /// `reply_from` is only used when a new context is created.
    pub async fn get_or_create(
        &self,
        identity: &ChannelAddress,
        reply_from: &ChannelAddress,
    ) -> SharedContext {
        if let Some(existing) = self.conversations.read().await.get(identity) {
            return Arc::clone(existing);
        }

        let mut conversations = self.conversations.write().await;
        let context = conversations.entry(identity.clone()).or_insert_with(|| {
            tracing::info!(conversation = %identity, "conversation started");
            Arc::new(Mutex::new(ConversationContext::new(
                identity.clone(),
                reply_from.clone(),
                self.mode,
            )))
        });
        Arc::clone(context)
    }

    pub async fn get(&self, identity: &ChannelAddress) -> Option<SharedContext> {
        self.conversations.read().await.get(identity).cloned()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    /// Drops conversations idle for at least `max_idle`.
    ///
    /// Contexts that are mid-turn or still referenced by a request are kept.
    /// Returns the number of conversations removed.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Timestamp::now();
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();

        conversations.retain(|identity, context| {
            if Arc::strong_count(context) > 1 {
                return true;
            }
            let keep = match context.try_lock() {
                Ok(guard) => !is_idle(now, guard.last_activity(), max_idle),
                Err(_) => true,
            };
            if !keep {
                tracing::debug!(conversation = %identity, "evicting idle conversation");
            }
            keep
        });

        before - conversations.len()
    }
}

fn is_idle(now: Timestamp, last_activity: Timestamp, max_idle: Duration) -> bool {
    now.duration_since(&last_activity)
        .to_std()
        .map(|idle| idle >= max_idle)
        .unwrap_or(false)
}

/// Configuration for the RegistrySweeper service.
#[derive(Debug, Clone)]
pub struct RegistrySweeperConfig {
    /// How often to look for idle conversations.
    pub sweep_interval: Duration,

    /// Inactivity after which a conversation is dropped.
    pub idle_timeout: Duration,
}

impl Default for RegistrySweeperConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Generated artifacts older than `max_age` are purged on every sweep.
struct ArtifactRetention {
    storage: Arc<dyn ArtifactStorage>,
    max_age: Duration,
}

/// Background service that evicts idle conversations and, when configured,
/// expired report artifacts.
pub struct RegistrySweeper {
    registry: Arc<ConversationRegistry>,
    config: RegistrySweeperConfig,
    retention: Option<ArtifactRetention>,
}

impl RegistrySweeper {
    pub fn new(registry: Arc<ConversationRegistry>, config: RegistrySweeperConfig) -> Self {
        Self {
            registry,
            config,
            retention: None,
        }
    }

    /// Also purge artifacts older than `max_age` from `storage`.
    pub fn with_artifact_retention(
        mut self,
        storage: Arc<dyn ArtifactStorage>,
        max_age: Duration,
    ) -> Self {
        self.retention = Some(ArtifactRetention { storage, max_age });
        self
    }

    /// Run the sweep loop until the shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::debug!("registry sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_once().await;
                    self.purge_artifacts().await;
                }
            }
        }
    }

    /// Run exactly one sweep.
    pub async fn sweep_once(&self) -> usize {
        let evicted = self.registry.evict_idle(self.config.idle_timeout).await;
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle conversations");
        }
        evicted
    }

    /// Purge expired artifacts; failures are logged and retried next sweep.
    pub async fn purge_artifacts(&self) -> usize {
        let Some(retention) = &self.retention else {
            return 0;
        };
        match retention.storage.purge_older_than(retention.max_age).await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(removed, "purged expired report artifacts");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "report artifact purge failed");
                0
            }
        }
    }
}
