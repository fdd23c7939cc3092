use std::time::Duration;

use tokio::time::Instant;

/// Where the dispatcher currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    /// A deferred delivery is armed for `deadline`.
    Scheduled { deadline: Instant },
    InFlight,
    /// A delivery is running and newer state is waiting behind it.
    InFlightCoalesced,
    Stopped,
}

/// What the driver must do after feeding an event to the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerAction {
    Nothing,
    /// Start a delivery cycle now. Any timer the driver holds is stale.
    Deliver,
    /// Arm a timer; when it fires, report `generation` back through
    /// [`Scheduler::on_timer_fired`].
    ArmTimer { deadline: Instant, generation: u64 },
}

#[derive(Clone, Copy, Debug)]
struct ArmedTimer {
    deadline: Instant,
    generation: u64,
}

/// Decides when delivery cycles run.
///
/// Guarantees at most one delivery in flight, at least `interval` between
/// the starts of two transport calls, and that a change arriving at any point
/// is eventually delivered. Pure state; the caller supplies the clock.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    last_delivery: Option<Instant>,
    timer: Option<ArmedTimer>,
    next_generation: u64,
    in_flight: bool,
    coalesced: bool,
    stopped: bool,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_delivery: None,
            timer: None,
            next_generation: 0,
            in_flight: false,
            coalesced: false,
            stopped: false,
        }
    }

    pub fn phase(&self) -> DispatchPhase {
        if self.stopped {
            DispatchPhase::Stopped
        } else if self.in_flight && self.coalesced {
            DispatchPhase::InFlightCoalesced
        } else if self.in_flight {
            DispatchPhase::InFlight
        } else if let Some(timer) = self.timer {
            DispatchPhase::Scheduled {
                deadline: timer.deadline,
            }
        } else {
            DispatchPhase::Idle
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn last_delivery(&self) -> Option<Instant> {
        self.last_delivery
    }

    /// Generation of the timer currently armed, if any.
    pub fn armed_generation(&self) -> Option<u64> {
        self.timer.map(|timer| timer.generation)
    }

    /// State changed and should eventually be shown.
    pub fn trigger(&mut self, now: Instant) -> SchedulerAction {
        if self.stopped {
            return SchedulerAction::Nothing;
        }

        if self.in_flight {
            // Completion re-triggers from its own timestamp.
            self.coalesced = true;
            return SchedulerAction::Nothing;
        }

        if self.timer.is_some() {
            // The armed timer renders whatever the state is when it fires.
            return SchedulerAction::Nothing;
        }

        let deadline = self.next_permitted(now);
        if deadline <= now {
            self.begin_delivery()
        } else {
            self.arm_timer(deadline)
        }
    }

    /// Deliver now regardless of the interval, unless a delivery is already
    /// running, in which case the change rides on the follow-up cycle.
    pub fn flush(&mut self, _now: Instant) -> SchedulerAction {
        if self.stopped {
            return SchedulerAction::Nothing;
        }
        if self.in_flight {
            self.coalesced = true;
            return SchedulerAction::Nothing;
        }
        self.timer = None;
        self.begin_delivery()
    }

    pub fn on_timer_fired(&mut self, generation: u64, _now: Instant) -> SchedulerAction {
        match self.timer {
            Some(timer) if timer.generation == generation => {}
            _ => return SchedulerAction::Nothing,
        }
        self.timer = None;

        if self.stopped {
            return SchedulerAction::Nothing;
        }
        if self.in_flight {
            // The completion of the running delivery picks this up.
            self.coalesced = true;
            return SchedulerAction::Nothing;
        }
        self.begin_delivery()
    }

    /// A delivery cycle finished. `attempted` is false when the sink skipped
    /// the transport call because nothing changed.
    pub fn on_delivery_complete(&mut self, attempted: bool, now: Instant) -> SchedulerAction {
        self.in_flight = false;
        if attempted {
            self.last_delivery = Some(now);
        }
        // A timer armed during the flight was sized from the previous
        // delivery; the follow-up is re-armed from this one.
        self.timer = None;
        if self.stopped || !self.coalesced {
            return SchedulerAction::Nothing;
        }
        self.coalesced = false;
        self.trigger(now)
    }

    /// Abandon a cycle that was granted but never reached the transport.
    pub fn abandon_delivery(&mut self) {
        self.in_flight = false;
    }

    /// Enter the terminal state. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        self.timer = None;
        self.coalesced = false;
        true
    }

    fn next_permitted(&self, now: Instant) -> Instant {
        match self.last_delivery {
            Some(last) => last + self.interval,
            None => now,
        }
    }

    fn begin_delivery(&mut self) -> SchedulerAction {
        self.in_flight = true;
        SchedulerAction::Deliver
    }

    fn arm_timer(&mut self, deadline: Instant) -> SchedulerAction {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.timer = Some(ArmedTimer {
            deadline,
            generation,
        });
        SchedulerAction::ArmTimer {
            deadline,
            generation,
        }
    }
}
