//! # Domain Models
//!
//! These structs represent the core entities of the joke labeler.
//! Jokes and labels use integer row ids; visitors get a random UUID v4 token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type JokeId = i64;
pub type LabelId = i64;

/// A unit of text content available for annotation. Never mutated after import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joke {
    pub id: JokeId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// An anonymous participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Visitor {
    /// A fresh visitor with a newly generated token.
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now,
        }
    }
}

/// One visitor's judgment on one joke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub joke_id: JokeId,
    pub visitor_id: Uuid,
    pub no_punchline: bool,
    pub created_at: DateTime<Utc>,
    /// Spans owned by this label; written and removed together with it.
    pub segments: Vec<LabelSegment>,
}

/// A character-offset range within a joke's text.
/// `start_index <= end_index` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSegment {
    pub id: i64,
    pub label_id: LabelId,
    pub start_index: i64,
    pub end_index: i64,
}

/// A complete span, ready to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: i64,
    pub end: i64,
}

/// A label that has passed validation but has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLabel {
    pub joke_id: JokeId,
    pub visitor_id: Uuid,
    pub no_punchline: bool,
    pub created_at: DateTime<Utc>,
    pub spans: Vec<Span>,
}

/// How to choose among eligible jokes sharing the minimal label count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Smallest joke id wins. Deterministic.
    #[default]
    LowestId,
    Random,
}
