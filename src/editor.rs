/*!
The application state and the logic that drives it.

The GUI (or a test) emits `Msg`s down a channel; the `Editor` consumes them
one at a time on the GUI thread, dispatches filter passes to worker
threads, and tells its `View` what to show.
*/

use std::mem;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::anim::{Scheduler, State, Tick, Timer};
use crate::config::Config;
use crate::filter::Shift;
use crate::load;
use crate::worker::{self, Done, Job, Waker};

/** Which of the two image panes. */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaneId {
    /// Filtered one step at a time by the "Step" button.
    A,
    /// Filtered repeatedly while the animation is running.
    B,
}

impl PaneId {
    pub const BOTH: [PaneId; 2] = [PaneId::A, PaneId::B];

    fn idx(self) -> usize {
        match self {
            PaneId::A => 0,
            PaneId::B => 1,
        }
    }
}

/**
Everything that can happen to the editor. The GUI sends most of these in
response to user actions; `Tick` comes from the animation timer and `Done`
from a worker thread.
*/
#[derive(Debug)]
pub enum Msg {
    /// The user picked a file to load.
    Load(PathBuf),
    /// The user clicked "Step" under pane A.
    Step,
    /// The user clicked "Start"/"Stop" under pane B.
    Toggle,
    /// The animation timer fired.
    Tick,
    /// The panes changed size and need their images rescaled.
    Resized,
    /// A worker finished a filter pass.
    Done(Done),
}

/**
What the `Editor` needs from whatever is displaying things.
*/
pub trait View {
    /** Display `img` in `pane`, replacing whatever was there. */
    fn show_image(&mut self, pane: PaneId, img: &RgbaImage);
    /** Reflect whether the animation is running (the Start/Stop label). */
    fn set_running(&mut self, running: bool);
    /** Pop up a message for the user. */
    fn notice(&mut self, msg: &str);
}

#[derive(Debug)]
enum Slot {
    Empty,
    Ready(RgbaImage),
    // The buffer is out with a worker.
    Busy,
}

#[derive(Debug)]
struct Pane {
    slot: Slot,
    // Bumped on every load, so results from a replaced buffer can be
    // recognized and thrown away.
    generation: u64,
    // Step clicks that arrived while a pass was in flight.
    queued: usize,
    // Filter passes completed since the last load.
    passes: u64,
}

impl Pane {
    fn new() -> Pane {
        Pane { slot: Slot::Empty, generation: 0, queued: 0, passes: 0 }
    }

    fn is_busy(&self) -> bool { matches!(self.slot, Slot::Busy) }
    fn is_empty(&self) -> bool { matches!(self.slot, Slot::Empty) }
}

pub struct Editor<V: View, T: Timer> {
    panes: [Pane; 2],
    sched: Scheduler,
    shift: Shift,
    view: V,
    timer: T,
    pipe: mpsc::Sender<Msg>,
    wake: Waker,
}

impl<V: View, T: Timer> Editor<V, T> {
    /**
    `pipe` is the sending end of the channel the editor's messages arrive
    on; workers use it to report back. `wake` gets called by a worker after
    it reports.
    */
    pub fn new(
        cfg: &Config,
        view: V,
        timer: T,
        pipe: mpsc::Sender<Msg>,
        wake: Waker,
    ) -> Editor<V, T> {
        Editor {
            panes: [Pane::new(), Pane::new()],
            sched: Scheduler::new(cfg.tick_interval()),
            shift: cfg.shift,
            view,
            timer,
            pipe,
            wake,
        }
    }

    pub fn handle(&mut self, msg: Msg) {
        match msg {
            Msg::Load(path) => self.load(&path),
            Msg::Step => self.step(),
            Msg::Toggle => self.toggle(),
            Msg::Tick => self.tick(),
            Msg::Resized => self.redisplay(),
            Msg::Done(done) => self.finish(done),
        }
    }

    fn pane(&self, id: PaneId) -> &Pane { &self.panes[id.idx()] }
    fn pane_mut(&mut self, id: PaneId) -> &mut Pane { &mut self.panes[id.idx()] }

    pub fn is_busy(&self, id: PaneId) -> bool { self.pane(id).is_busy() }
    pub fn is_loaded(&self, id: PaneId) -> bool { !self.pane(id).is_empty() }

    /**
    Handle everything currently waiting in `rx` without blocking. Any
    number of queued `Resized`s get handled once, after the rest.
    */
    pub fn drain(&mut self, rx: &mpsc::Receiver<Msg>) {
        let mut resized = false;
        while let Ok(m) = rx.try_recv() {
            match m {
                Msg::Resized => { resized = true; },
                m => self.handle(m),
            }
        }
        if resized { self.redisplay(); }
    }

    fn load(&mut self, path: &Path) {
        let (a, b) = match load::load_pair(path) {
            Ok(pair) => pair,
            Err(e) => {
                warn!("{}", &e);
                self.view.notice(&e.to_string());
                return;
            },
        };

        for (id, img) in [(PaneId::A, a), (PaneId::B, b)] {
            self.view.show_image(id, &img);
            let p = self.pane_mut(id);
            if p.is_busy() {
                debug!(pane = ?id, "replacing image with a pass in flight");
            }
            p.slot = Slot::Ready(img);
            p.generation += 1;
            p.queued = 0;
            p.passes = 0;
        }
        self.sched.reset_counts();
    }

    fn step(&mut self) {
        let p = self.pane_mut(PaneId::A);
        let idle = match p.slot {
            Slot::Empty => {
                debug!("step with nothing loaded");
                false
            },
            Slot::Busy => {
                p.queued += 1;
                debug!(queued = p.queued, "step queued behind pass in flight");
                false
            },
            Slot::Ready(_) => true,
        };
        if idle { self.dispatch(PaneId::A); }
    }

    fn toggle(&mut self) {
        let loaded = self.is_loaded(PaneId::B);
        match self.sched.toggle(loaded, &mut self.timer) {
            Ok(state) => self.view.set_running(state == State::Running),
            Err(e) => {
                info!("{}", &e);
                self.view.notice(&e.to_string());
            },
        }
    }

    fn tick(&mut self) {
        let busy = self.is_busy(PaneId::B);
        if let Tick::Apply = self.sched.tick(busy) {
            self.dispatch(PaneId::B);
        }
    }

    // Hand `id`'s buffer to a worker. Does nothing unless the pane is
    // holding an idle buffer.
    fn dispatch(&mut self, id: PaneId) {
        let shift = self.shift;
        let p = self.pane_mut(id);
        let buffer = match mem::replace(&mut p.slot, Slot::Busy) {
            Slot::Ready(img) => img,
            other => {
                p.slot = other;
                return;
            },
        };

        let job = Job { pane: id, generation: p.generation, shift, buffer };
        worker::spawn(job, self.pipe.clone(), self.wake.clone());
    }

    fn finish(&mut self, done: Done) {
        let Done { pane: id, generation, buffer } = done;
        let p = self.pane_mut(id);
        if generation != p.generation {
            debug!(pane = ?id, generation, "discarding result for replaced image");
            return;
        }

        p.slot = Slot::Ready(buffer);
        p.passes += 1;
        let requeue = if p.queued > 0 {
            p.queued -= 1;
            true
        } else {
            false
        };

        if let Slot::Ready(img) = &self.panes[id.idx()].slot {
            self.view.show_image(id, img);
        }

        if requeue { self.dispatch(id); }
    }

    fn redisplay(&mut self) {
        for id in PaneId::BOTH {
            if let Slot::Ready(img) = &self.panes[id.idx()].slot {
                self.view.show_image(id, img);
            }
        }
    }
}

// Inspection for tests.
#[cfg(test)]
impl<V: View, T: Timer> Editor<V, T> {
    // The buffer held by `id`, if it has one and it isn't out being filtered.
    pub(crate) fn image(&self, id: PaneId) -> Option<&RgbaImage> {
        match &self.pane(id).slot {
            Slot::Ready(img) => Some(img),
            _ => None,
        }
    }

    // Filter passes applied to `id` since it was last loaded.
    pub(crate) fn passes(&self, id: PaneId) -> u64 { self.pane(id).passes }

    pub(crate) fn state(&self) -> State { self.sched.state() }
    pub(crate) fn scheduler(&self) -> &Scheduler { &self.sched }
    pub(crate) fn view(&self) -> &V { &self.view }
    pub(crate) fn timer(&self) -> &T { &self.timer }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    use image::Rgba;

    use crate::anim::test::ManualTimer;
    use crate::worker::no_waker;

    #[derive(Debug, Default)]
    struct RecordingView {
        shown: Vec<(PaneId, RgbaImage)>,
        running: bool,
        notices: Vec<String>,
    }

    impl RecordingView {
        fn last_shown(&self, id: PaneId) -> Option<&RgbaImage> {
            self.shown.iter().rev().find(|(p, _)| *p == id).map(|(_, i)| i)
        }
    }

    impl View for RecordingView {
        fn show_image(&mut self, pane: PaneId, img: &RgbaImage) {
            self.shown.push((pane, img.clone()));
        }
        fn set_running(&mut self, running: bool) { self.running = running; }
        fn notice(&mut self, msg: &str) { self.notices.push(msg.to_owned()); }
    }

    type TestEditor = Editor<RecordingView, ManualTimer>;

    fn editor() -> (TestEditor, mpsc::Receiver<Msg>) {
        let (tx, rx) = mpsc::channel();
        let e = Editor::new(
            &Config::default(),
            RecordingView::default(),
            ManualTimer::default(),
            tx,
            no_waker(),
        );
        (e, rx)
    }

    // Feed completions back in until nothing is in flight.
    fn settle(e: &mut TestEditor, rx: &mpsc::Receiver<Msg>) {
        while PaneId::BOTH.iter().any(|&id| e.is_busy(id)) {
            let m = rx.recv_timeout(Duration::from_secs(10)).unwrap();
            e.handle(m);
        }
    }

    fn black_png(dir: &tempfile::TempDir) -> PathBuf {
        let fname = dir.path().join("black.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])).save(&fname).unwrap();
        fname
    }

    #[test]
    fn four_steps() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        e.handle(Msg::Load(black_png(&dir)));

        for _ in 0..4 {
            e.handle(Msg::Step);
            settle(&mut e, &rx);
        }

        assert_eq!(e.passes(PaneId::A), 4);
        for p in e.image(PaneId::A).unwrap().pixels() {
            assert_eq!(p.0, [32, 20, 48, 255]);
        }
        let shown = e.view().last_shown(PaneId::A).unwrap();
        assert_eq!(shown.get_pixel(0, 0).0, [32, 20, 48, 255]);

        // Pane B is its own copy and hasn't moved.
        assert_eq!(e.image(PaneId::B).unwrap().get_pixel(1, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn rapid_steps_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        e.handle(Msg::Load(black_png(&dir)));

        for _ in 0..4 { e.handle(Msg::Step); }
        assert!(e.is_busy(PaneId::A));
        settle(&mut e, &rx);

        assert_eq!(e.passes(PaneId::A), 4);
        assert_eq!(e.image(PaneId::A).unwrap().get_pixel(0, 1).0, [32, 20, 48, 255]);
    }

    #[test]
    fn step_with_nothing_loaded() {
        let (mut e, rx) = editor();
        e.handle(Msg::Step);
        assert!(!e.is_busy(PaneId::A));
        assert!(e.view().notices.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn start_with_nothing_loaded() {
        let (mut e, _rx) = editor();
        e.handle(Msg::Toggle);
        assert_eq!(e.state(), State::Stopped);
        assert_eq!(e.view().notices, ["Please load Image B first!"]);
        assert_eq!(e.timer().starts, 0);
        assert!(!e.view().running);
    }

    #[test]
    fn corrupt_file_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        e.handle(Msg::Load(black_png(&dir)));
        e.handle(Msg::Step);
        settle(&mut e, &rx);
        let before_a = e.image(PaneId::A).unwrap().clone();
        let before_b = e.image(PaneId::B).unwrap().clone();
        let n_shown = e.view().shown.len();

        let bad = dir.path().join("corrupt.png");
        std::fs::write(&bad, [0x89, b'P', b'N', b'G', 0, 1, 2, 3]).unwrap();
        e.handle(Msg::Load(bad));

        assert_eq!(e.view().notices.len(), 1);
        assert_eq!(e.view().shown.len(), n_shown);
        assert_eq!(e.image(PaneId::A).unwrap(), &before_a);
        assert_eq!(e.image(PaneId::B).unwrap(), &before_b);
        assert_eq!(e.passes(PaneId::A), 1);
    }

    #[test]
    fn corrupt_file_with_nothing_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, _rx) = editor();
        let bad = dir.path().join("corrupt.jpg");
        std::fs::write(&bad, b"garbage").unwrap();
        e.handle(Msg::Load(bad));

        assert_eq!(e.view().notices.len(), 1);
        assert!(e.view().shown.is_empty());
        assert!(!e.is_loaded(PaneId::A));
        assert!(!e.is_loaded(PaneId::B));
    }

    #[test]
    fn animation_counts_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        e.handle(Msg::Load(black_png(&dir)));

        e.handle(Msg::Toggle);
        assert_eq!(e.state(), State::Running);
        assert!(e.view().running);
        assert_eq!(e.timer().running, Some(Duration::from_millis(120)));

        // Three ticks that each finish before the next one...
        for _ in 0..3 {
            e.handle(Msg::Tick);
            settle(&mut e, &rx);
        }
        // ...then two that overlap a pass in flight.
        e.handle(Msg::Tick);
        e.handle(Msg::Tick);
        e.handle(Msg::Tick);
        settle(&mut e, &rx);

        e.handle(Msg::Toggle);
        assert_eq!(e.state(), State::Stopped);
        assert!(!e.view().running);
        assert_eq!(e.timer().running, None);

        // A tick that was already queued when "Stop" was hit.
        e.handle(Msg::Tick);
        assert!(!e.is_busy(PaneId::B));

        assert_eq!(e.scheduler().applied(), 4);
        assert_eq!(e.scheduler().dropped(), 2);
        assert_eq!(e.passes(PaneId::B), 4);

        let mut want = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        crate::filter::apply(&mut want, Shift::default().times(4));
        assert_eq!(e.image(PaneId::B).unwrap(), &want);
        assert_eq!(e.passes(PaneId::A), 0);
    }

    #[test]
    fn stop_lets_pass_in_flight_finish() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        e.handle(Msg::Load(black_png(&dir)));
        e.handle(Msg::Toggle);
        e.handle(Msg::Tick);
        e.handle(Msg::Toggle);
        assert_eq!(e.state(), State::Stopped);

        settle(&mut e, &rx);
        assert_eq!(e.passes(PaneId::B), 1);
        let shown = e.view().last_shown(PaneId::B).unwrap();
        assert_eq!(shown.get_pixel(0, 0).0, [8, 5, 12, 255]);
    }

    #[test]
    fn reload_discards_stale_result() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        let fname = black_png(&dir);
        e.handle(Msg::Load(fname.clone()));
        e.handle(Msg::Step);
        assert!(e.is_busy(PaneId::A));

        e.handle(Msg::Load(fname));
        assert!(!e.is_busy(PaneId::A));

        let m = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        e.handle(m);
        assert_eq!(e.passes(PaneId::A), 0);
        assert_eq!(e.image(PaneId::A).unwrap().get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn resize_redisplays_idle_panes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, _rx) = editor();
        e.handle(Msg::Resized);
        assert!(e.view().shown.is_empty());

        e.handle(Msg::Load(black_png(&dir)));
        let n = e.view().shown.len();
        e.handle(Msg::Resized);
        assert_eq!(e.view().shown.len(), n + 2);
    }

    #[test]
    fn reload_while_animating() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        let fname = black_png(&dir);
        e.handle(Msg::Load(fname.clone()));
        e.handle(Msg::Toggle);
        e.handle(Msg::Tick);
        assert!(e.is_busy(PaneId::B));

        e.handle(Msg::Load(fname));
        assert!(!e.is_busy(PaneId::B));
        assert_eq!(e.scheduler().applied(), 0);

        // The pass started on the old buffer comes back and is thrown out.
        let m = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        e.handle(m);
        assert_eq!(e.passes(PaneId::B), 0);
        assert_eq!(e.image(PaneId::B).unwrap().get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(e.state(), State::Running);

        // The next tick works on the new buffer.
        e.handle(Msg::Tick);
        assert!(e.is_busy(PaneId::B));
        settle(&mut e, &rx);
        assert_eq!(e.passes(PaneId::B), 1);
        assert_eq!(e.image(PaneId::B).unwrap().get_pixel(1, 0).0, [8, 5, 12, 255]);
    }

    #[test]
    fn tick_count_matches_buffer_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        let (mut e, rx) = editor();
        let fname = black_png(&dir);
        e.handle(Msg::Load(fname.clone()));
        e.handle(Msg::Toggle);
        e.handle(Msg::Tick);
        e.handle(Msg::Load(fname));
        settle(&mut e, &rx);
        // Let the discarded pass arrive before counting.
        if let Ok(m) = rx.recv_timeout(Duration::from_secs(10)) { e.handle(m); }
        e.handle(Msg::Tick);
        settle(&mut e, &rx);
        e.handle(Msg::Toggle);

        let applied = e.scheduler().applied();
        assert_eq!(applied, e.passes(PaneId::B));
        let mut want = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        crate::filter::apply(&mut want, Shift::default().times(applied));
        assert_eq!(e.image(PaneId::B).unwrap(), &want);
    }

    #[test]
    fn queued_resizes_are_coalesced() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let mut e = Editor::new(
            &Config::default(),
            RecordingView::default(),
            ManualTimer::default(),
            tx.clone(),
            no_waker(),
        );
        e.handle(Msg::Load(black_png(&dir)));
        let n = e.view().shown.len();

        for _ in 0..5 { tx.send(Msg::Resized).unwrap(); }
        e.drain(&rx);
        // One redisplay, covering both panes.
        assert_eq!(e.view().shown.len(), n + 2);

        // Other messages in the batch are still handled; the busy pane
        // gets skipped by the redisplay.
        tx.send(Msg::Resized).unwrap();
        tx.send(Msg::Step).unwrap();
        tx.send(Msg::Resized).unwrap();
        e.drain(&rx);
        assert_eq!(e.view().shown.len(), n + 3);
        assert_eq!(e.view().shown.last().unwrap().0, PaneId::B);
        assert!(e.is_busy(PaneId::A));
        settle(&mut e, &rx);
        assert_eq!(e.passes(PaneId::A), 1);
    }
}
