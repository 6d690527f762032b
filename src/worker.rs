/*!
Running the filter off the GUI thread.

A `Job` owns the buffer it works on, so while a job is out there is simply
no buffer left in the pane for anyone else to touch. When the pass is done
the buffer comes back down the pipe inside a `Msg::Done`.
*/

use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, warn};

use crate::editor::{Msg, PaneId};
use crate::filter::{self, Shift};

/**
Called from the worker thread after the completion message has been sent,
so a sleeping event loop notices it.
*/
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/** A waker that does nothing, for when nobody is asleep. */
#[cfg(test)]
pub fn no_waker() -> Waker { Arc::new(|| {}) }

#[derive(Debug)]
pub struct Job {
    pub pane: PaneId,
    pub generation: u64,
    pub shift: Shift,
    pub buffer: RgbaImage,
}

/** A finished `Job`, with its buffer filtered. */
#[derive(Debug)]
pub struct Done {
    pub pane: PaneId,
    pub generation: u64,
    pub buffer: RgbaImage,
}

/**
Run `job` on its own thread. Exactly one `Msg::Done` will be sent down
`pipe` when it finishes (unless the receiving end is gone by then).
*/
pub fn spawn(job: Job, pipe: mpsc::Sender<Msg>, wake: Waker) {
    thread::spawn(move || {
        let Job { pane, generation, shift, mut buffer } = job;
        let t0 = Instant::now();
        filter::apply(&mut buffer, shift);
        debug!(
            ?pane, generation,
            elapsed_us = t0.elapsed().as_micros() as u64,
            "filter pass finished"
        );

        let done = Done { pane, generation, buffer };
        if pipe.send(Msg::Done(done)).is_err() {
            warn!(?pane, "nobody left to receive filtered image");
            return;
        }
        wake();
    });
}
