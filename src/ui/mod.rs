//! UI rendering module
//!
//! This module contains all the rendering logic for the terminal user
//! interface, using the ratatui library for TUI components.

pub mod browse;
pub mod help_overlay;
pub mod item_detail;
pub mod profile_select;

pub use browse::render as render_browse;
pub use help_overlay::render as render_help_overlay;
pub use item_detail::render as render_item_detail;
pub use profile_select::render as render_profile_select;
