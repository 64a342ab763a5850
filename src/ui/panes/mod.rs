//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`lessons`]: the unit list with pass/fail markers
//! - [`source`]: the page with syntax highlighting, current line and results column
//! - [`bindings`]: names visible at the current step
//! - [`output`]: output printed up to the current step
//! - [`status`]: status bar with keybindings and execution state
//!
//! Each pane module exports a stateless `render_*` function; scroll state is
//! owned by the [`App`](crate::ui::App) and passed in.

pub mod bindings;
pub mod lessons;
pub mod output;
pub mod source;
pub mod status;

pub use bindings::render_bindings_pane;
pub use lessons::{render_lesson_list, LessonEntry};
pub use output::render_output_pane;
pub use source::{render_source_pane, sidebar_results, SourceRenderData, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
