//! # Label submissions
//!
//! The wire shape of a label submission and the validation step that turns it
//! into a [`LabelSubmission`] or a [`LabelRejection`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::LabelRejection;
use crate::models::{JokeId, NewLabel, Span};

/// A span as sent by the client. Either offset may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SegmentInput {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl SegmentInput {
    /// Only spans with both offsets present are kept. Zero is a valid offset.
    pub fn complete(&self) -> Option<Span> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(Span { start, end }),
            _ => None,
        }
    }
}

/// Body of `POST /submit_label`. Every field is optional on the wire so that
/// missing values surface as validation errors instead of parse failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SubmitLabelRequest {
    pub joke_id: Option<JokeId>,
    pub segments: Option<Vec<SegmentInput>>,
    pub no_punchline: Option<bool>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSubmission {
    pub joke_id: JokeId,
    pub no_punchline: bool,
    /// Complete spans only; incomplete entries were dropped.
    pub spans: Vec<Span>,
}

impl SubmitLabelRequest {
    pub fn validate(self) -> Result<LabelSubmission, LabelRejection> {
        let joke_id = self.joke_id.ok_or(LabelRejection::MissingJokeId)?;
        let segments = self.segments.unwrap_or_default();
        let no_punchline = self.no_punchline.unwrap_or(false);

        // The emptiness check looks at what was sent, not at what survives
        // the completeness filter below.
        if segments.is_empty() && !no_punchline {
            return Err(LabelRejection::EmptySubmission);
        }

        Ok(LabelSubmission {
            joke_id,
            no_punchline,
            spans: segments.iter().filter_map(SegmentInput::complete).collect(),
        })
    }
}

impl LabelSubmission {
    pub fn into_new_label(self, visitor_id: Uuid, created_at: DateTime<Utc>) -> NewLabel {
        NewLabel {
            joke_id: self.joke_id,
            visitor_id,
            no_punchline: self.no_punchline,
            created_at,
            spans: self.spans,
        }
    }
}
