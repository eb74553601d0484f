//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Joke, JokeId, Label, NewLabel, TieBreak, Visitor};

#[cfg(test)]
use mockall::automock;

/// Persistence contract for the joke corpus.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JokeRepo: Send + Sync {
    async fn insert_joke(&self, text: &str) -> anyhow::Result<Joke>;
    async fn get_joke(&self, id: JokeId) -> anyhow::Result<Option<Joke>>;

    /// The joke with the fewest labels overall among those `visitor_id` has
    /// not labeled yet. `None` once the visitor has labeled everything.
    async fn least_labeled_for(
        &self,
        visitor_id: Uuid,
        tie_break: TieBreak,
    ) -> anyhow::Result<Option<Joke>>;
}

/// Persistence contract for labels and their segments.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LabelRepo: Send + Sync {
    /// Writes the label and all of its spans in a single transaction.
    async fn insert_label(&self, label: NewLabel) -> anyhow::Result<Label>;
    async fn labels_for_joke(&self, joke_id: JokeId) -> anyhow::Result<Vec<Label>>;
}

/// Persistence contract for anonymous visitors.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VisitorRepo: Send + Sync {
    async fn get_visitor(&self, id: Uuid) -> anyhow::Result<Option<Visitor>>;
    async fn create_visitor(&self, visitor: Visitor) -> anyhow::Result<()>;
}
