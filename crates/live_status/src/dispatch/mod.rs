//! Coalescing dispatcher.
//!
//! Owns the session state, the [`Scheduler`] and the [`RemoteSink`] of one
//! status message. Mutations lock the session, apply the change and ask the
//! scheduler what to do; deliveries and timers run as spawned tasks that
//! report back through the same lock. The sink has its own lock, held for the
//! whole duration of a remote call, so remote calls never overlap.

pub mod scheduler;

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::{StatusConfig, MAX_MESSAGE_LENGTH};
use crate::render::arguments::truncate_chars;
use crate::render::{render_session, render_summary};
use crate::sink::{DeliveryOutcome, MessageId, RemoteSink};
use crate::state::SessionState;

pub use self::scheduler::{DispatchPhase, Scheduler, SchedulerAction};

/// How a dispatcher leaves the active state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Freeze; leave the remote message as it is.
    Stop,
    /// Freeze and remove the remote message.
    Delete,
    /// Freeze after one final delivery of the given text, or of the default
    /// summary when `None`.
    Collapse(Option<String>),
    /// Freeze after one final delivery of the current state.
    Keep,
}

struct Core {
    session: SessionState,
    scheduler: Scheduler,
    timer: Option<ArmedTimerTask>,
}

struct ArmedTimerTask {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Shared {
    config: StatusConfig,
    core: Mutex<Core>,
    sink: Mutex<RemoteSink>,
}

/// Cheap to clone; all clones drive the same status message.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(config: StatusConfig, sink: RemoteSink) -> Self {
        let scheduler = Scheduler::new(config.thinking.interval());
        Self {
            shared: Arc::new(Shared {
                config,
                core: Mutex::new(Core {
                    session: SessionState::new(),
                    scheduler,
                    timer: None,
                }),
                sink: Mutex::new(sink),
            }),
        }
    }

    pub fn config(&self) -> &StatusConfig {
        &self.shared.config
    }

    /// Apply `change` to the session and schedule an update if it reports a
    /// visible change. Returns false without touching the session once the
    /// dispatcher is stopped.
    pub async fn mutate<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut SessionState) -> bool,
    {
        let mut core = self.shared.core.lock().await;
        if core.scheduler.is_stopped() {
            return false;
        }
        if change(&mut core.session) {
            let action = core.scheduler.trigger(Instant::now());
            self.shared.apply(&mut core, action);
        }
        true
    }

    /// Request an update cycle without changing the session.
    pub async fn trigger(&self) {
        let mut core = self.shared.core.lock().await;
        let action = core.scheduler.trigger(Instant::now());
        self.shared.apply(&mut core, action);
    }

    pub async fn flush(&self) {
        let mut core = self.shared.core.lock().await;
        let action = core.scheduler.flush(Instant::now());
        self.shared.apply(&mut core, action);
    }

    /// Leave the active state. Returns false if the dispatcher had already
    /// terminated, in which case nothing happens.
    ///
    /// A delivery already in flight is not interrupted: it finishes and its
    /// result is recorded in the delivery state, but no follow-up cycle runs.
    /// Delete and collapse wait for it, so they act on the message it created.
    pub async fn terminate(&self, how: Termination) -> bool {
        let final_text = {
            let mut core = self.shared.core.lock().await;
            if !core.scheduler.stop() {
                return false;
            }
            if let Some(timer) = core.timer.take() {
                timer.handle.abort();
            }
            match &how {
                Termination::Collapse(Some(summary)) => {
                    Some(truncate_chars(summary, MAX_MESSAGE_LENGTH - 3))
                }
                Termination::Collapse(None) => {
                    Some(render_summary(core.session.completed_count()))
                }
                Termination::Keep => Some(render_session(&core.session, &self.shared.config)),
                Termination::Stop | Termination::Delete => None,
            }
        };
        debug!(?how, "status dispatcher terminating");

        match how {
            Termination::Stop => {}
            Termination::Delete => {
                self.shared.sink.lock().await.remove().await;
            }
            Termination::Collapse(_) | Termination::Keep => {
                if let Some(text) = final_text {
                    self.shared.sink.lock().await.deliver(&text).await;
                }
            }
        }
        true
    }

    pub async fn phase(&self) -> DispatchPhase {
        self.shared.core.lock().await.scheduler.phase()
    }

    pub async fn is_stopped(&self) -> bool {
        self.shared.core.lock().await.scheduler.is_stopped()
    }

    /// Text the next delivery cycle would send.
    pub async fn rendered(&self) -> String {
        let core = self.shared.core.lock().await;
        render_session(&core.session, &self.shared.config)
    }

    pub async fn completed_count(&self) -> usize {
        self.shared.core.lock().await.session.completed_count()
    }

    /// Waits for a remote call in flight to finish.
    pub async fn message_id(&self) -> Option<MessageId> {
        self.shared.sink.lock().await.message_id().cloned()
    }
}

impl Shared {
    fn apply(self: &Arc<Self>, core: &mut Core, action: SchedulerAction) {
        // Any timer the scheduler no longer tracks is stale.
        let armed = core.scheduler.armed_generation();
        if core
            .timer
            .as_ref()
            .is_some_and(|timer| Some(timer.generation) != armed)
        {
            if let Some(timer) = core.timer.take() {
                timer.handle.abort();
            }
        }

        match action {
            SchedulerAction::Nothing => {}
            SchedulerAction::Deliver => {
                trace!("status delivery cycle starting");
                tokio::spawn(Arc::clone(self).run_cycle());
            }
            SchedulerAction::ArmTimer {
                deadline,
                generation,
            } => {
                trace!(generation, "status delivery deferred");
                let shared = Arc::clone(self);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    shared.timer_fired(generation).await;
                });
                core.timer = Some(ArmedTimerTask { generation, handle });
            }
        }
    }

    async fn timer_fired(self: Arc<Self>, generation: u64) {
        let mut core = self.core.lock().await;
        if core
            .timer
            .as_ref()
            .is_some_and(|timer| timer.generation == generation)
        {
            // Our own handle; dropping it detaches rather than aborts.
            core.timer = None;
        }
        let action = core.scheduler.on_timer_fired(generation, Instant::now());
        self.apply(&mut core, action);
    }

    async fn run_cycle(self: Arc<Self>) {
        let text = {
            let mut core = self.core.lock().await;
            if core.scheduler.is_stopped() {
                core.scheduler.abandon_delivery();
                return;
            }
            render_session(&core.session, &self.config)
        };

        let outcome = self.sink.lock().await.deliver(&text).await;
        if outcome == DeliveryOutcome::Failed {
            debug!("status delivery failed; next change retries");
        }

        let mut core = self.core.lock().await;
        let action = core
            .scheduler
            .on_delivery_complete(outcome.attempted(), Instant::now());
        self.apply(&mut core, action);
    }
}
