//! Presentation-layer Notifications
//!
//! Names and envelopes for everything the cores publish. A front end maps
//! these onto its own redraw mechanism; the CLI prints them as JSON lines.

use serde::{Deserialize, Serialize};

use crate::core::encoding::TaskEvent;
use crate::core::subtitles::DocumentEvent;
use crate::core::CoreResult;

// =============================================================================
// Event Names
// =============================================================================

/// Event names used for front-end communication
pub mod event_names {
    /// Encode task created
    pub const ENCODE_SUBMITTED: &str = "encode:submitted";
    /// Encode task status changed
    pub const ENCODE_STATUS: &str = "encode:status";
    /// Encode task progress
    pub const ENCODE_PROGRESS: &str = "encode:progress";
    /// Encode task cancellation accepted
    pub const ENCODE_CANCEL_REQUESTED: &str = "encode:cancel-requested";
    /// Encode task reached a terminal state
    pub const ENCODE_FINISHED: &str = "encode:finished";
    /// Subtitle table rebuilt
    pub const SUBTITLES_REBUILT: &str = "subtitles:rebuilt";
    /// Single subtitle entry changed
    pub const SUBTITLE_CHANGED: &str = "subtitles:entry-changed";
    /// Editor text regenerated from the table
    pub const EDITOR_TEXT_REPLACED: &str = "subtitles:text-replaced";
}

impl DocumentEvent {
    /// Event name for the presentation layer
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntriesRebuilt { .. } => event_names::SUBTITLES_REBUILT,
            Self::EntryChanged { .. } => event_names::SUBTITLE_CHANGED,
            Self::EditorTextReplaced => event_names::EDITOR_TEXT_REPLACED,
        }
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Named notification with its JSON payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Event name from [`event_names`]
    pub name: String,
    /// Serialized event
    pub payload: serde_json::Value,
}

impl Notification {
    pub fn from_task_event(event: &TaskEvent) -> CoreResult<Self> {
        Ok(Self {
            name: event.name().to_string(),
            payload: serde_json::to_value(event)?,
        })
    }

    pub fn from_document_event(event: &DocumentEvent) -> CoreResult<Self> {
        Ok(Self {
            name: event.name().to_string(),
            payload: serde_json::to_value(event)?,
        })
    }

    /// Single-line JSON form
    pub fn to_json_line(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
