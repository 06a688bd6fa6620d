//! Keep-alive worker — probes E2T instances and shuts down the silent ones.
//!
//! Every tick broadcasts a keep-alive request, then checks each instance's
//! last response time. Responses themselves arrive through
//! [`E2tInstancesManager::reset_keep_alive`], which ignores instances being
//! deleted, so an instance whose shutdown failed stays expired and is
//! handed to shutdown again on every tick. The shutdown manager's deletion
//! window decides when that retry actually runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use e2mgr_core::{InstanceState, Message, MessageSender, now_nanos};

use crate::instances::E2tInstancesManager;
use crate::shutdown::E2tShutdownManager;

pub struct E2tKeepAliveWorker {
    instances: Arc<E2tInstancesManager>,
    shutdown: Arc<E2tShutdownManager>,
    sender: Arc<dyn MessageSender>,
    /// Interval between probes.
    delay: Duration,
    /// Silence after which an instance is considered dead.
    response_timeout: Duration,
}

impl E2tKeepAliveWorker {
    pub fn new(
        instances: Arc<E2tInstancesManager>,
        shutdown: Arc<E2tShutdownManager>,
        sender: Arc<dyn MessageSender>,
        delay: Duration,
        response_timeout: Duration,
    ) -> Self {
        Self {
            instances,
            shutdown,
            sender,
            delay,
            response_timeout,
        }
    }

    /// Run until the shutdown signal fires.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            delay_ms = self.delay.as_millis() as u64,
            response_timeout_ms = self.response_timeout.as_millis() as u64,
            "keep-alive worker started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {
                    self.tick().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("keep-alive worker shutting down");
                    break;
                }
            }
        }
    }

    /// One probe-and-check round.
    pub async fn tick(&self) {
        self.sender.send_without_logs(Message::keep_alive_request());

        let instances = match self.instances.list_quiet().await {
            Ok(instances) => instances,
            Err(e) => {
                debug!(error = %e, "keep-alive check skipped");
                return;
            }
        };

        let timeout = i64::try_from(self.response_timeout.as_nanos()).unwrap_or(i64::MAX);
        let now = now_nanos();
        for instance in instances {
            let silence = now.saturating_sub(instance.keep_alive_timestamp);
            if silence <= timeout {
                continue;
            }

            if instance.state == InstanceState::Active {
                warn!(
                    address = %instance.address,
                    silence_ms = silence / 1_000_000,
                    "e2t instance missed keep-alive, shutting it down"
                );
            } else {
                debug!(address = %instance.address, "e2t instance still pending deletion");
            }
            if let Err(e) = self.shutdown.shutdown(&instance).await {
                error!(address = %instance.address, error = %e, "e2t instance shutdown failed");
            }
        }
    }
}
