/*!
A two-pane image viewer that color-shifts images.

The left pane gets filtered one step at a time; the right one gets filtered
over and over on a timer, for an animated effect.
*/

pub mod anim;
pub mod config;
pub mod editor;
pub mod filter;
pub mod load;
pub mod ui;
pub mod worker;
