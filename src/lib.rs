pub mod api;
pub mod config;
pub mod data;
pub mod schema;
pub mod selection;
pub mod session;
pub mod state;
pub mod ui;
pub mod utils;
