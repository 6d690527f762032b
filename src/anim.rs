/*!
The animation scheduler.

Turns a stream of timer ticks into requests to run the filter on the
animated pane. The scheduler itself knows nothing about timers or threads;
the `Timer` trait is the seam where the GUI's repeating timeout plugs in.
*/

use std::time::Duration;

use tracing::{debug, info};

/** Default time between animation ticks. */
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(120);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Stopped,
    Running,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StartError {
    #[error("Please load Image B first!")]
    NothingLoaded,
}

/** What to do about a tick that just fired. */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Run the filter on the animated pane.
    Apply,
    /// The previous pass hasn't finished yet; skip this one.
    Dropped,
    /// The scheduler is stopped; this tick was already on its way when
    /// the user hit "Stop".
    Ignored,
}

/**
A repeating timer. Once started, it should arrange for a tick to be
delivered to the `Scheduler` every `interval` until stopped.
*/
pub trait Timer {
    fn start(&mut self, interval: Duration);
    fn stop(&mut self);
}

#[derive(Debug)]
pub struct Scheduler {
    state: State,
    interval: Duration,
    applied: u64,
    dropped: u64,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Scheduler {
        Scheduler {
            state: State::Stopped,
            interval,
            applied: 0,
            dropped: 0,
        }
    }

    pub fn state(&self) -> State { self.state }
    pub fn is_running(&self) -> bool { self.state == State::Running }
    pub fn interval(&self) -> Duration { self.interval }

    /** Number of ticks that resulted in a filter pass. */
    pub fn applied(&self) -> u64 { self.applied }
    /** Number of ticks skipped because a pass was still in flight. */
    pub fn dropped(&self) -> u64 { self.dropped }

    /**
    Zero the applied/dropped counts. Called when the animated pane gets a
    new image, so the counts always describe the buffer being shown.
    */
    pub fn reset_counts(&mut self) {
        self.applied = 0;
        self.dropped = 0;
    }

    /**
    Go from `Stopped` to `Running`, starting `timer`.

    `loaded` says whether the animated pane has an image; if it doesn't,
    nothing happens and an error is returned. Starting a running scheduler
    is a no-op.
    */
    pub fn start<T: Timer + ?Sized>(
        &mut self,
        loaded: bool,
        timer: &mut T
    ) -> Result<(), StartError> {
        if self.is_running() { return Ok(()); }
        if !loaded { return Err(StartError::NothingLoaded); }

        self.state = State::Running;
        timer.start(self.interval);
        info!(interval_ms = self.interval.as_millis() as u64, "animation started");
        Ok(())
    }

    /** Go to `Stopped`, cancelling `timer`. Always succeeds. */
    pub fn stop<T: Timer + ?Sized>(&mut self, timer: &mut T) {
        if !self.is_running() { return; }

        timer.stop();
        self.state = State::Stopped;
        info!(applied = self.applied, dropped = self.dropped, "animation stopped");
    }

    /** What the "Start"/"Stop" button does. */
    pub fn toggle<T: Timer + ?Sized>(
        &mut self,
        loaded: bool,
        timer: &mut T
    ) -> Result<State, StartError> {
        match self.state {
            State::Running => self.stop(timer),
            State::Stopped => self.start(loaded, timer)?,
        }
        Ok(self.state)
    }

    /**
    Account for one timer tick. `busy` says whether a filter pass on the
    animated pane is still in flight.
    */
    pub fn tick(&mut self, busy: bool) -> Tick {
        match (self.state, busy) {
            (State::Stopped, _) => Tick::Ignored,
            (State::Running, true) => {
                self.dropped += 1;
                debug!(dropped = self.dropped, "tick dropped; pass still in flight");
                Tick::Dropped
            },
            (State::Running, false) => {
                self.applied += 1;
                Tick::Apply
            },
        }
    }
}

impl Default for Scheduler {
    fn default() -> Scheduler { Scheduler::new(DEFAULT_INTERVAL) }
}
