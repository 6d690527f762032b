/*!
The user interface.

All the FLTK business lives down here. The widgets don't hold any of the
images or the animation state; they just send `Msg`s to the `Editor` and
display what it tells them to.
*/

use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use fltk::{
    prelude::*,
    app::{self, App, Scheme},
    button::Button,
    dialog,
    enums::{Color, Event, Font, FrameType, Key},
    frame::Frame,
    group::Flex,
    window::DoubleWindow,
};
use image::RgbaImage;
use tracing::{info, warn};

use crate::config::Config;
use crate::editor::{Editor, Msg, PaneId, View};
use crate::worker::Waker;

pub mod img;
pub mod timer;

use img::ImgPane;
use timer::FltkTimer;

const TITLE_HEIGHT: i32 = 40;
const TITLE_FONT_SIZE: i32 = 22;
const BUTTON_ROW_HEIGHT: i32 = 40;
const BUTTON_WIDTH: i32 = 140;
const BUTTON_FONT_SIZE: i32 = 16;
const MARGIN: i32 = 20;
const GAP: i32 = 20;

const RESIZE_SETTLE_SECS: f64 = 0.1;

const BACKGROUND: (u8, u8, u8) = (255, 255, 255);
const PANEL: (u8, u8, u8) = (245, 245, 245);
const BUTTON: (u8, u8, u8) = (100, 150, 250);

const IMAGE_FILTER: &str = "*.{png,jpg,jpeg,gif,bmp}";

fn rgb_to_fltk(c: (u8, u8, u8)) -> Color {
    Color::from_rgb(c.0, c.1, c.2)
}

fn send(pipe: &mpsc::Sender<Msg>, m: Msg) {
    if let Err(e) = pipe.send(m) {
        warn!("editor is gone; dropping {:?}", &e.0);
    }
}

fn themed_button(label: &str) -> Button {
    let mut b = Button::default().with_label(label);
    b.set_color(rgb_to_fltk(BUTTON));
    b.set_selection_color(rgb_to_fltk(BUTTON).darker());
    b.set_label_color(Color::Black);
    b.set_label_font(Font::HelveticaBold);
    b.set_label_size(BUTTON_FONT_SIZE);
    b.set_frame(FrameType::BorderBox);
    b.clear_visible_focus();
    b
}

// A horizontal `Flex` with a single button of fixed width centered in it.
// The caller sets the row's height.
fn centered_button_row(label: &str) -> (Flex, Button) {
    let mut row = Flex::default().row();
    Frame::default();
    let b = themed_button(label);
    row.fixed(&b, BUTTON_WIDTH);
    Frame::default();
    row.end();
    (row, b)
}

/**
The main window, as seen by the `Editor`.
*/
pub struct FltkView {
    win: DoubleWindow,
    panes: [ImgPane; 2],
    start_butt: Button,
}

impl View for FltkView {
    fn show_image(&mut self, pane: PaneId, img: &RgbaImage) {
        let p = match pane {
            PaneId::A => &mut self.panes[0],
            PaneId::B => &mut self.panes[1],
        };
        p.set_image(img);
    }

    fn set_running(&mut self, running: bool) {
        self.start_butt.set_label(if running { "Stop" } else { "Start" });
        self.start_butt.redraw();
    }

    fn notice(&mut self, msg: &str) {
        dialog::message_title("Pixel Editor");
        dialog::message_default(msg);
        self.win.redraw();
    }
}

impl FltkView {
    /**
    Build and show the main window. User actions get sent down `pipe`.
    */
    pub fn new(cfg: &Config, pipe: mpsc::Sender<Msg>) -> FltkView {
        let wcfg = &cfg.window;
        let mut w = DoubleWindow::default()
            .with_size(wcfg.width, wcfg.height)
            .center_screen();
        w.set_label(&wcfg.title);
        w.set_color(rgb_to_fltk(BACKGROUND));
        w.make_resizable(true);

        let mut col = Flex::default_fill().column();
        col.set_margin(MARGIN);
        col.set_pad(GAP / 2);

        let mut title = Frame::default().with_label(&wcfg.title);
        title.set_label_font(Font::HelveticaBold);
        title.set_label_size(TITLE_FONT_SIZE);
        col.fixed(&title, TITLE_HEIGHT);

        let (load_row, mut load_butt) = centered_button_row("Load Image");
        col.fixed(&load_row, BUTTON_ROW_HEIGHT);

        let mut grid = Flex::default().row();
        grid.set_pad(GAP);

        let mut card_a = Flex::default().column();
        card_a.set_pad(GAP / 2);
        let pane_a = ImgPane::new("Image A");
        let (step_row, mut step_butt) = centered_button_row("Step");
        card_a.fixed(&step_row, BUTTON_ROW_HEIGHT);
        card_a.end();

        let mut card_b = Flex::default().column();
        card_b.set_pad(GAP / 2);
        let pane_b = ImgPane::new("Image B");
        let (start_row, mut start_butt) = centered_button_row("Start");
        card_b.fixed(&start_row, BUTTON_ROW_HEIGHT);
        card_b.end();

        grid.end();
        col.end();

        for mut card in [card_a, card_b] {
            card.set_frame(FrameType::FlatBox);
            card.set_color(rgb_to_fltk(PANEL));
        }

        w.end();
        #[cfg(feature = "hide_before_raise")]
        w.hide();
        w.show();

        load_butt.set_callback({
            let pipe = pipe.clone();
            move |_| {
                if let Some(fname) = dialog::file_chooser(
                    "Load Image", IMAGE_FILTER, ".", false
                ) {
                    send(&pipe, Msg::Load(PathBuf::from(fname)));
                }
            }
        });
        step_butt.set_callback({
            let pipe = pipe.clone();
            move |_| send(&pipe, Msg::Step)
        });
        start_butt.set_callback({
            let pipe = pipe.clone();
            move |_| send(&pipe, Msg::Toggle)
        });

        w.handle(|_, evt| {
            match evt {
                Event::KeyDown => match app::event_key() {
                    Key::Escape => {
                        // Pretend like we've handled it so the app
                        // won't quit.
                        true
                    },
                    _ => false,
                },
                _ => false,
            }
        });
        // A drag produces a stream of resize events; only rescale once it
        // has been quiet for a moment.
        w.resize_callback({
            let pipe = pipe.clone();
            let mut pending: Option<app::TimeoutHandle> = None;
            move |_, _, _, _, _| {
                if let Some(h) = pending.take() {
                    if app::has_timeout3(h) { app::remove_timeout3(h); }
                }
                let pipe = pipe.clone();
                pending = Some(app::add_timeout3(RESIZE_SETTLE_SECS, move |_| {
                    send(&pipe, Msg::Resized)
                }));
            }
        });
        // But do quit when the window is closed.
        w.set_callback(|_| { app::quit(); });

        FltkView {
            win: w,
            panes: [pane_a, pane_b],
            start_butt,
        }
    }
}

/**
Open the main window and run until it's closed. If `initial` is given,
that image is loaded straight away.
*/
pub fn run(cfg: &Config, initial: Option<PathBuf>) {
    let a = App::default().with_scheme(Scheme::Gtk);
    let (r, g, b) = BACKGROUND;
    app::background(r, g, b);

    let (tx, rx) = mpsc::channel::<Msg>();
    let view = FltkView::new(cfg, tx.clone());
    let timer = FltkTimer::new(tx.clone());
    let wake: Waker = Arc::new(app::awake);
    let mut editor = Editor::new(cfg, view, timer, tx, wake);

    if let Some(path) = initial {
        editor.handle(Msg::Load(path));
    }

    info!("entering event loop");
    while a.wait() {
        editor.drain(&rx);
    }
    info!("event loop finished");
}
