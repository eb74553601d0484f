//! # jl-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `jl-core` domain models.

mod schema;

use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use jl_core::models::{Joke, JokeId, Label, LabelSegment, NewLabel, TieBreak, Visitor};
use jl_core::traits::{JokeRepo, LabelRepo, VisitorRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// One pool, every port.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

// Helpers for row conversion
fn row_to_joke(row: &SqliteRow) -> anyhow::Result<Joke> {
    Ok(Joke {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
    })
}

fn parse_visitor_id(raw: &str) -> anyhow::Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("malformed visitor id {raw:?} in database"))
}

impl SqliteStore {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::with_max_connections(url, 5).await
    }

    /// Connects and makes sure every table exists.
    ///
    /// # Developer Note
    /// Every connection to an in-memory database sees its own empty database,
    /// so those URLs get exactly one connection that is never recycled.
    pub async fn with_max_connections(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid database url {url}"))?
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open {url}"))?;

        let store = Self { pool };
        store.apply_schema().await?;
        log::info!("SQLite store ready at {url}");
        Ok(store)
    }

    async fn apply_schema(&self) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for statement in schema::STATEMENTS {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await.context("failed to apply schema")?;
        Ok(())
    }
}

#[async_trait]
impl JokeRepo for SqliteStore {
    async fn insert_joke(&self, text: &str) -> anyhow::Result<Joke> {
        let created_at = Utc::now();
        let id = sqlx::query("INSERT INTO jokes (text, created_at) VALUES (?, ?)")
            .bind(text)
            .bind(created_at)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(Joke {
            id,
            text: text.to_string(),
            created_at,
        })
    }

    async fn get_joke(&self, id: JokeId) -> anyhow::Result<Option<Joke>> {
        let row = sqlx::query("SELECT id, text, created_at FROM jokes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_joke).transpose()
    }

    async fn least_labeled_for(
        &self,
        visitor_id: Uuid,
        tie_break: TieBreak,
    ) -> anyhow::Result<Option<Joke>> {
        let sql = schema::least_labeled_query(tie_break == TieBreak::Random);
        let row = sqlx::query(&sql)
            .bind(visitor_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("least-labeled joke query failed")?;

        row.as_ref().map(row_to_joke).transpose()
    }
}

#[async_trait]
impl LabelRepo for SqliteStore {
    /// Atomic operation to create a label and its segments.
    ///
    /// # Developer Note
    /// Using a Transaction (tx) ensures we never keep a label whose segments
    /// failed to insert, or segments without their label.
    async fn insert_label(&self, label: NewLabel) -> anyhow::Result<Label> {
        let mut tx = self.pool.begin().await?;

        // 1. Insert Label
        let label_id = sqlx::query(
            "INSERT INTO labels (joke_id, visitor_id, no_punchline, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(label.joke_id)
        .bind(label.visitor_id.to_string())
        .bind(label.no_punchline)
        .bind(label.created_at)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to insert label for joke {}", label.joke_id))?
        .last_insert_rowid();

        // 2. Insert owned segments
        let mut segments = Vec::with_capacity(label.spans.len());
        for span in &label.spans {
            let id = sqlx::query(
                "INSERT INTO label_segments (label_id, start_index, end_index) VALUES (?, ?, ?)",
            )
            .bind(label_id)
            .bind(span.start)
            .bind(span.end)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            segments.push(LabelSegment {
                id,
                label_id,
                start_index: span.start,
                end_index: span.end,
            });
        }

        tx.commit().await.context("label commit failed")?;

        Ok(Label {
            id: label_id,
            joke_id: label.joke_id,
            visitor_id: label.visitor_id,
            no_punchline: label.no_punchline,
            created_at: label.created_at,
            segments,
        })
    }

    async fn labels_for_joke(&self, joke_id: JokeId) -> anyhow::Result<Vec<Label>> {
        let rows = sqlx::query(
            "SELECT id, joke_id, visitor_id, no_punchline, created_at FROM labels WHERE joke_id = ? ORDER BY id ASC",
        )
        .bind(joke_id)
        .fetch_all(&self.pool)
        .await?;

        let mut labels = rows
            .iter()
            .map(|row| -> anyhow::Result<Label> {
                Ok(Label {
                    id: row.try_get("id")?,
                    joke_id: row.try_get("joke_id")?,
                    visitor_id: parse_visitor_id(row.try_get("visitor_id")?)?,
                    no_punchline: row.try_get("no_punchline")?,
                    created_at: row.try_get("created_at")?,
                    segments: Vec::new(),
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let segment_rows = sqlx::query(
            "SELECT s.id, s.label_id, s.start_index, s.end_index
             FROM label_segments s
             JOIN labels l ON l.id = s.label_id
             WHERE l.joke_id = ?
             ORDER BY s.id ASC",
        )
        .bind(joke_id)
        .fetch_all(&self.pool)
        .await?;

        for row in &segment_rows {
            let segment = LabelSegment {
                id: row.try_get("id")?,
                label_id: row.try_get("label_id")?,
                start_index: row.try_get("start_index")?,
                end_index: row.try_get("end_index")?,
            };
            if let Some(owner) = labels.iter_mut().find(|l| l.id == segment.label_id) {
                owner.segments.push(segment);
            }
        }

        Ok(labels)
    }
}

#[async_trait]
impl VisitorRepo for SqliteStore {
    async fn get_visitor(&self, id: Uuid) -> anyhow::Result<Option<Visitor>> {
        let row = sqlx::query("SELECT id, created_at FROM visitors WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Visitor {
                id: parse_visitor_id(row.try_get("id")?)?,
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn create_visitor(&self, visitor: Visitor) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO visitors (id, created_at) VALUES (?, ?)")
            .bind(visitor.id.to_string())
            .bind(visitor.created_at)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to create visitor {}", visitor.id))?;
        Ok(())
    }
}
