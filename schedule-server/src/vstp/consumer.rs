//! Long-running consumer of the amendment topic.
//!
//! The consumer is an explicit state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Subscribed -> Consuming
//!       ^              |             |            |
//!       +--------------+-------------+------------+
//! ```
//!
//! Any transport failure, empty message body or undecodable message drops
//! back to `Disconnected`; reconnect attempts back off exponentially. A
//! failure to store an otherwise valid amendment is logged and consumption
//! continues with the next message.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::store::ScheduleStore;

use super::convert::{decode_message, to_schedule};
use super::error::VstpError;

/// Topic carrying every VSTP amendment.
pub const VSTP_TOPIC: &str = "/topic/VSTP_ALL";

/// One message received from the broker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delivery {
    pub body: Vec<u8>,
    /// Acknowledgement handle; `None` when the broker sent none.
    pub ack_id: Option<String>,
}

/// A source of amendment sessions (a broker).
pub trait AmendmentSource: Send + Sync {
    type Session: AmendmentSession;

    fn connect(&self) -> impl Future<Output = Result<Self::Session, VstpError>> + Send;
}

/// An open connection to the amendment topic.
pub trait AmendmentSession: Send + Sized {
    fn subscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), VstpError>> + Send;

    fn next_delivery(&mut self) -> impl Future<Output = Result<Delivery, VstpError>> + Send;

    fn ack(&mut self, delivery: &Delivery) -> impl Future<Output = Result<(), VstpError>> + Send;

    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Exponential reconnect delay: starts at `initial`, doubles per failure up
/// to `max`, and resets after a successful subscription.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Delay to wait now; the following call returns double (capped).
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60))
    }
}

/// Where the consumer is in its lifecycle.
#[derive(Debug)]
pub enum ConsumerState<T> {
    Disconnected,
    Connecting,
    Subscribed(T),
    Consuming(T),
}

impl<T> ConsumerState<T> {
    pub fn name(&self) -> &'static str {
        match self {
            ConsumerState::Disconnected => "disconnected",
            ConsumerState::Connecting => "connecting",
            ConsumerState::Subscribed(_) => "subscribed",
            ConsumerState::Consuming(_) => "consuming",
        }
    }
}

/// Consumes amendments from `source` and writes them to `store`.
pub struct VstpConsumer<A: AmendmentSource, S> {
    source: A,
    store: Arc<S>,
    backoff: Backoff,
    topic: String,
}

impl<A: AmendmentSource, S: ScheduleStore> VstpConsumer<A, S> {
    pub fn new(source: A, store: Arc<S>) -> Self {
        Self {
            source,
            store,
            backoff: Backoff::default(),
            topic: VSTP_TOPIC.to_string(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run until `shutdown` becomes `true` (or its sender is dropped).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(topic = %self.topic, "starting VSTP consumer");
        let mut state = ConsumerState::Disconnected;
        loop {
            tokio::select! {
                next = self.step(state) => state = next,
                _ = shutdown.wait_for(|stop| *stop) => {
                    info!("VSTP consumer stopping");
                    return;
                }
            }
        }
    }

    /// Perform one transition.
    pub async fn step(&mut self, state: ConsumerState<A::Session>) -> ConsumerState<A::Session> {
        match state {
            ConsumerState::Disconnected => ConsumerState::Connecting,
            ConsumerState::Connecting => self.connect().await,
            ConsumerState::Subscribed(session) => {
                info!(topic = %self.topic, "subscribed to amendment topic");
                ConsumerState::Consuming(session)
            }
            ConsumerState::Consuming(session) => self.consume_one(session).await,
        }
    }

    async fn connect(&mut self) -> ConsumerState<A::Session> {
        let mut session = match self.source.connect().await {
            Ok(session) => session,
            Err(e) => {
                self.pause(&e).await;
                return ConsumerState::Disconnected;
            }
        };

        match session.subscribe(&self.topic).await {
            Ok(()) => {
                self.backoff.reset();
                ConsumerState::Subscribed(session)
            }
            Err(e) => {
                session.close().await;
                self.pause(&e).await;
                ConsumerState::Disconnected
            }
        }
    }

    async fn pause(&mut self, cause: &VstpError) {
        let delay = self.backoff.next_delay();
        warn!(
            error = %cause,
            retry_in_secs = delay.as_secs(),
            "failed to connect to amendment feed"
        );
        tokio::time::sleep(delay).await;
    }

    async fn consume_one(&mut self, mut session: A::Session) -> ConsumerState<A::Session> {
        let delivery = match session.next_delivery().await {
            Ok(d) if d.body.is_empty() => {
                error!(error = %VstpError::EmptyBody, "amendment stream failed");
                session.close().await;
                return ConsumerState::Disconnected;
            }
            Ok(d) => d,
            Err(e) => {
                error!(error = %e, "amendment stream failed");
                session.close().await;
                return ConsumerState::Disconnected;
            }
        };

        let msg = match decode_message(&delivery.body) {
            Ok(msg) => msg,
            Err(e) => {
                error!(error = %e, "failed to decode amendment");
                session.close().await;
                return ConsumerState::Disconnected;
            }
        };

        let mut schedule = to_schedule(&msg.msg.schedule);
        schedule.augment();
        let train_uid = schedule.train_uid.clone();
        let combined_id = schedule.combined_id.clone();

        match self.store.insert_schedule(schedule).await {
            Ok(id) => {
                debug!(id, %train_uid, %combined_id, "stored amendment");
                if let Err(e) = session.ack(&delivery).await {
                    error!(error = %e, "failed to acknowledge amendment");
                    session.close().await;
                    return ConsumerState::Disconnected;
                }
            }
            // Left unacknowledged; the broker may redeliver after a reconnect
            Err(e) => error!(error = %e, %train_uid, "failed to store amendment"),
        }

        ConsumerState::Consuming(session)
    }
}
