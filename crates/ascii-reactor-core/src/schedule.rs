//! Named tasks with explicit cancellation, driven by a caller-supplied clock.
//!
//! Nothing here spawns or sleeps. The host polls tasks from its own loop and
//! passes `now` in, so the same code runs under a window's update callback
//! and under a test with a fake clock.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

/// Shared cancel flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Permission to run exactly one frame of a frame task.
///
/// A ticket outlives its task's cancellation only as a no-op: once the task
/// is cancelled or restarted, every ticket issued before is dead.
#[derive(Clone, Debug)]
pub struct FrameTicket {
    token: CancellationToken,
    seq: u64,
}

impl FrameTicket {
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// How many frames this task has run before this one
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Ticket for the following frame, under the same token
    pub fn next(&self) -> FrameTicket {
        FrameTicket {
            token: self.token.clone(),
            seq: self.seq + 1,
        }
    }
}

/// Lets per-frame work through once per rendered frame when the host loop
/// ticks faster than frames are presented.
#[derive(Clone, Debug, Default)]
pub struct FrameGate {
    last_frame: Option<u64>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` the first time `frame` (a presented-frame counter) is seen
    pub fn advance(&mut self, frame: u64) -> bool {
        if self.last_frame == Some(frame) {
            return false;
        }
        self.last_frame = Some(frame);
        true
    }
}

/// A named task: either once per display frame (`period == None`) or on a
/// fixed interval.
#[derive(Debug)]
pub struct ScheduledTask {
    name: &'static str,
    period: Option<Duration>,
    token: CancellationToken,
    next_due: Option<Duration>,
}

impl ScheduledTask {
    /// Runs whenever the host renders a frame
    pub fn per_frame(name: &'static str) -> Self {
        Self {
            name,
            period: None,
            token: CancellationToken::new(),
            next_due: None,
        }
    }

    /// Runs every `period`, starting one period after the first poll
    pub fn interval(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period: Some(period),
            token: CancellationToken::new(),
            next_due: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn set_period(&mut self, period: Duration) {
        self.period = Some(period);
        self.next_due = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the task should run at `now`.
    ///
    /// Interval tasks that fell behind run once and re-arm from `now`
    /// rather than firing a burst of catch-up runs.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        let Some(period) = self.period else {
            return true;
        };
        match self.next_due {
            None => {
                self.next_due = Some(now + period);
                false
            }
            Some(due) if now >= due => {
                let next = due + period;
                self.next_due = Some(if next <= now { now + period } else { next });
                true
            }
            Some(_) => false,
        }
    }

    /// Fresh token and schedule; tickets from before are dead
    pub fn restart(&mut self) -> FrameTicket {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.next_due = None;
        debug!(task = self.name, "task restarted");
        FrameTicket {
            token: self.token.clone(),
            seq: 0,
        }
    }

    pub fn cancel(&mut self) {
        if !self.token.is_cancelled() {
            debug!(task = self.name, "task cancelled");
        }
        self.token.cancel();
        self.next_due = None;
    }
}
