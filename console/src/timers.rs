use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::dashboard::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Reloads the job list while the monitor page is shown.
    List,
    /// Reloads the open job while the detail page is shown.
    Detail,
}

impl TimerKind {
    pub fn period(&self) -> Duration {
        match self {
            TimerKind::List => Duration::from_millis(common::LIST_REFRESH_MS),
            TimerKind::Detail => Duration::from_millis(common::DETAIL_REFRESH_MS),
        }
    }
}

/// An armed interval. Dropping the handle stops the interval.
#[derive(Debug)]
pub struct TimerHandle {
    kind: TimerKind,
    generation: u64,
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Single-slot timer owner: arming replaces whatever was armed. Ticks carry
/// the arming generation so queued ticks of a disarmed timer can be dropped.
pub struct TimerCoordinator {
    events: UnboundedSender<Event>,
    armed: Option<TimerHandle>,
    generation: u64,
}

impl TimerCoordinator {
    pub fn new(events: UnboundedSender<Event>) -> Self {
        Self { events, armed: None, generation: 0 }
    }

    /// Starts the interval for `kind`, stopping any armed timer first. The
    /// first tick fires one full period after arming.
    pub fn arm(&mut self, kind: TimerKind) {
        self.armed = None;
        self.generation += 1;
        let generation = self.generation;
        let period = kind.period();
        let events = self.events.clone();
        let start = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(Event::TimerFired { kind, generation }).is_err() {
                    break;
                }
            }
        });

        log::debug!("Armed {:?} refresh timer (generation {})", kind, generation);
        self.armed = Some(TimerHandle { kind, generation, task });
    }

    /// Stops the armed timer if it is of `kind`.
    pub fn disarm(&mut self, kind: TimerKind) {
        if self.armed_kind() == Some(kind) {
            log::debug!("Disarmed {:?} refresh timer", kind);
            self.armed = None;
        }
    }

    pub fn armed_kind(&self) -> Option<TimerKind> {
        self.armed.as_ref().map(TimerHandle::kind)
    }

    /// Whether a tick belongs to the currently armed timer.
    pub fn is_current(&self, kind: TimerKind, generation: u64) -> bool {
        self.armed
            .as_ref()
            .map_or(false, |h| h.kind == kind && h.generation == generation)
    }
}
