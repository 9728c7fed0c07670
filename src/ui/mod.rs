//! Terminal user interface: screen/mode state machine, modal forms, and the
//! crossterm event loop.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
