/*!
Windows executable.

Same as the main binary, minus the console window and the command line.
*/
#![windows_subsystem = "windows"]

use pixel_editor::{config::Config, ui};

fn main() {
    ui::run(&Config::default(), None);
}
