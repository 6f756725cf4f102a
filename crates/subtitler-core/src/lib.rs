//! Subtitler Core Library
//!
//! Subtitle spotting model and background encode engine.
//! This library contains all business logic of the application; the
//! presentation layer (windows, tables, dialogs) consumes it through the
//! public contracts exposed here and redraws on the notifications it publishes.
//!
//! The two engines are:
//! - [`core::subtitles`]: the editor-text <-> timed-entry synchronization model
//!   plus SRT / plain text import and export.
//! - [`core::encoding`]: background encode tasks driving an external encoder
//!   process, with progress extraction and cooperative cancellation.

pub mod core;
pub mod events;
pub mod logging;

pub use crate::core::{CoreError, CoreResult};
