//! Status relay - periodic polling and push to listeners
//!
//! The relay is a single task that owns the service status. Polls and
//! listener commands run in their own tasks and report back over a
//! channel, each tagged with a sequence id taken when the call was issued
//! (polls) or resolved (commands). The relay task applies them in sequence
//! order and publishes every accepted change to all subscribed listeners.
//!
//! Listeners subscribe through [`RelayHandle::subscribe`] and unsubscribe by
//! dropping the receiver. Publishing with no subscribers does nothing.

pub mod bridge;
pub mod message;
pub mod state;
pub mod view;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::common::config::RelayConfig;
use crate::daemon::{DaemonClient, StatusReport};

use message::{CommandReply, Reply, Request, StatusUpdate};
use state::{Observation, RelayState};

pub use view::{RemoteView, UiState};

/// State shared between the relay task and its handles
struct Shared {
    client: DaemonClient,
    next_seq: AtomicU64,
    observations: mpsc::UnboundedSender<(u64, Observation)>,
    pokes: mpsc::Sender<()>,
    updates: broadcast::Sender<StatusUpdate>,
    cancel: CancellationToken,
}

impl Shared {
    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Hand an observation to the relay task; dropped if it has stopped
    fn observe(&self, seq: u64, observation: Observation) {
        let _ = self.observations.send((seq, observation));
    }

    /// Ask the relay task for an immediate poll
    fn poke(&self) {
        // a full queue already holds a pending poll
        let _ = self.pokes.try_send(());
    }

    fn spawn_poll(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        let seq = shared.next_seq();
        tokio::spawn(async move {
            let report = shared.client.status().await;
            shared.observe(seq, Observation::Status(report));
        });
    }
}

/// The relay task
pub struct StatusRelay {
    shared: Arc<Shared>,
    state: RelayState,
    poll_interval: Duration,
    observations: mpsc::UnboundedReceiver<(u64, Observation)>,
    pokes: mpsc::Receiver<()>,
}

/// Cloneable handle for talking to a running relay
#[derive(Clone)]
pub struct RelayHandle {
    shared: Arc<Shared>,
}

impl StatusRelay {
    /// Create a relay and its handle. Nothing runs until [`StatusRelay::run`].
    pub fn new(client: DaemonClient, config: &RelayConfig) -> (Self, RelayHandle) {
        let (observations_tx, observations_rx) = mpsc::unbounded_channel();
        let (pokes_tx, pokes_rx) = mpsc::channel(1);
        let (updates, _) = broadcast::channel(config.channel_capacity);

        let shared = Arc::new(Shared {
            client,
            next_seq: AtomicU64::new(1),
            observations: observations_tx,
            pokes: pokes_tx,
            updates,
            cancel: CancellationToken::new(),
        });

        let relay = Self {
            shared: Arc::clone(&shared),
            state: RelayState::new(),
            poll_interval: config.poll_interval(),
            observations: observations_rx,
            pokes: pokes_rx,
        };

        (relay, RelayHandle { shared })
    }

    /// Create a relay and run it on its own task
    pub fn spawn(client: DaemonClient, config: &RelayConfig) -> (RelayHandle, JoinHandle<()>) {
        let (relay, handle) = Self::new(client, config);
        let task = tokio::spawn(relay.run());
        (handle, task)
    }

    /// Run until the handle's [`RelayHandle::shutdown`] is called
    pub async fn run(mut self) {
        tracing::info!(
            daemon = self.shared.client.base_url(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Status relay started"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.shared.cancel.cancelled() => break,
                _ = ticker.tick() => self.shared.spawn_poll(),
                Some(()) = self.pokes.recv() => self.shared.spawn_poll(),
                Some((seq, observation)) = self.observations.recv() => {
                    self.accept(seq, &observation);
                }
            }
        }

        tracing::info!("Status relay stopped");
    }

    fn accept(&mut self, seq: u64, observation: &Observation) {
        let was_online = self.state.status().daemon_online;

        let Some(update) = self.state.accept(seq, observation, Utc::now()) else {
            return;
        };

        if update.daemon_online != was_online {
            if update.daemon_online {
                tracing::info!("Daemon is online");
            } else {
                tracing::warn!(daemon = self.shared.client.base_url(), "Daemon went offline");
            }
        }

        self.publish(update);
    }

    fn publish(&self, update: StatusUpdate) {
        tracing::trace!(seq = update.seq, running = update.running, "Publishing status");
        if self.shared.updates.send(update).is_err() {
            tracing::trace!("No listeners attached");
        }
    }
}

impl RelayHandle {
    /// Register a listener for status pushes
    pub fn subscribe(&self) -> broadcast::Receiver<StatusUpdate> {
        self.shared.updates.subscribe()
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.shared.updates.receiver_count()
    }

    /// Answer a listener request
    pub async fn handle(&self, request: Request) -> Reply {
        match request {
            Request::StartService => Reply::Command(self.start().await),
            Request::StopService => Reply::Command(self.stop().await),
            Request::GetStatus => Reply::Status(self.get_status().await),
        }
    }

    /// Start the service; on success the relay records it and re-polls
    pub async fn start(&self) -> CommandReply {
        let result = self.shared.client.start_with_cancel(&self.shared.cancel).await;
        if result.is_ok() {
            self.shared.observe(self.shared.next_seq(), Observation::Started);
            self.shared.poke();
        }
        CommandReply::from_start(&result)
    }

    /// Stop the service; on success the relay records it and re-polls
    pub async fn stop(&self) -> CommandReply {
        let result = self.shared.client.stop().await;
        if result.is_ok() {
            self.shared.observe(self.shared.next_seq(), Observation::Stopped);
            self.shared.poke();
        }
        CommandReply::from_stop(&result)
    }

    /// Fetch status now. The result is also offered to the relay like any
    /// poll.
    pub async fn get_status(&self) -> StatusReport {
        let seq = self.shared.next_seq();
        let report = self.shared.client.status().await;
        self.shared.observe(seq, Observation::Status(report.clone()));
        report
    }

    /// Stop the relay task and abandon in-flight start retries
    pub fn shutdown(&self) {
        self.shared.cancel.cancel();
    }
}
