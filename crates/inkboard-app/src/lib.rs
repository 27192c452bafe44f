//! Inkboard Application
//!
//! Windowing, input translation and the toolbar around the board.

mod app;
mod input_map;
mod ui;

pub use app::{App, AppConfig};
pub use ui::{render_ui, UiAction, UiState};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
