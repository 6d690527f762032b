/*!
The animation timer, built on FLTK's repeating timeouts.
*/

use std::sync::mpsc;
use std::time::Duration;

use fltk::app::{self, TimeoutHandle};
use tracing::debug;

use crate::anim::Timer;
use crate::editor::Msg;

/**
Sends a `Msg::Tick` down its pipe every time the timeout fires, until
stopped. Only usable from the GUI thread.
*/
pub struct FltkTimer {
    pipe: mpsc::Sender<Msg>,
    handle: Option<TimeoutHandle>,
}

impl FltkTimer {
    pub fn new(pipe: mpsc::Sender<Msg>) -> FltkTimer {
        FltkTimer { pipe, handle: None }
    }
}

impl Timer for FltkTimer {
    fn start(&mut self, interval: Duration) {
        self.stop();
        let secs = interval.as_secs_f64();
        let pipe = self.pipe.clone();
        let h = app::add_timeout3(secs, move |h| {
            // If the receiver is gone the app is on its way out; just
            // let the timeout lapse.
            if pipe.send(Msg::Tick).is_ok() {
                app::repeat_timeout3(secs, h);
            }
        });
        debug!(secs, "timeout registered");
        self.handle = Some(h);
    }

    fn stop(&mut self) {
        if let Some(h) = self.handle.take() {
            if app::has_timeout3(h) {
                app::remove_timeout3(h);
            }
            debug!("timeout removed");
        }
    }
}
