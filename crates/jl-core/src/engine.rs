//! # Engines
//!
//! Joke assignment, label submission and visitor sessions. The visitor is
//! always passed in explicitly; nothing here reads request-scoped state.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};
use uuid::Uuid;

use crate::error::{LabelRejection, Result};
use crate::models::{Joke, Label, TieBreak, Visitor};
use crate::submission::SubmitLabelRequest;
use crate::traits::{JokeRepo, LabelRepo, VisitorRepo};

/// Picks the next joke a visitor should see.
#[derive(Clone)]
pub struct AssignmentEngine {
    jokes: Arc<dyn JokeRepo>,
    tie_break: TieBreak,
}

impl AssignmentEngine {
    pub fn new(jokes: Arc<dyn JokeRepo>, tie_break: TieBreak) -> Self {
        Self { jokes, tie_break }
    }

    /// The least-labeled joke this visitor has not labeled yet, or `None`
    /// when nothing is left for them.
    pub async fn next_joke(&self, visitor_id: Uuid) -> Result<Option<Joke>> {
        let joke = self
            .jokes
            .least_labeled_for(visitor_id, self.tie_break)
            .await?;
        if joke.is_none() {
            debug!("visitor {visitor_id} has labeled every joke");
        }
        Ok(joke)
    }
}

/// Validates and stores label submissions.
#[derive(Clone)]
pub struct LabelingEngine {
    jokes: Arc<dyn JokeRepo>,
    labels: Arc<dyn LabelRepo>,
}

impl LabelingEngine {
    pub fn new(jokes: Arc<dyn JokeRepo>, labels: Arc<dyn LabelRepo>) -> Self {
        Self { jokes, labels }
    }

    /// Nothing is written unless the request validates and names an existing
    /// joke. The label and its segments are stored atomically.
    pub async fn submit_label(
        &self,
        visitor_id: Uuid,
        request: SubmitLabelRequest,
    ) -> Result<Label> {
        let submission = request.validate()?;

        if self.jokes.get_joke(submission.joke_id).await?.is_none() {
            return Err(LabelRejection::UnknownJoke(submission.joke_id).into());
        }

        let label = self
            .labels
            .insert_label(submission.into_new_label(visitor_id, Utc::now()))
            .await?;

        info!(
            "label {} stored for joke {} by visitor {} ({} segments, no_punchline={})",
            label.id,
            label.joke_id,
            visitor_id,
            label.segments.len(),
            label.no_punchline
        );
        Ok(label)
    }
}

/// Hands every client a stable anonymous identity.
#[derive(Clone)]
pub struct VisitorSessions {
    visitors: Arc<dyn VisitorRepo>,
}

impl VisitorSessions {
    pub fn new(visitors: Arc<dyn VisitorRepo>) -> Self {
        Self { visitors }
    }

    /// Returns the presented visitor if the store knows it, otherwise creates
    /// and persists a new one.
    pub async fn ensure_visitor(&self, presented: Option<Uuid>) -> Result<Visitor> {
        if let Some(id) = presented {
            if let Some(visitor) = self.visitors.get_visitor(id).await? {
                return Ok(visitor);
            }
            debug!("presented visitor {id} is unknown, issuing a new one");
        }

        let visitor = Visitor::generate(Utc::now());
        self.visitors.create_visitor(visitor.clone()).await?;
        info!("new visitor {}", visitor.id);
        Ok(visitor)
    }
}
