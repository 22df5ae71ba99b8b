//! User interface layer
//!
//! `table_renderer` builds a display model from a state snapshot;
//! `table_display` draws it in the terminal.

pub mod table_display;
pub mod table_renderer;
