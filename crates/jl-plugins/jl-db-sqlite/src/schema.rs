//! Table definitions. Applied idempotently every time a store connects.

pub(crate) const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS jokes (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        text        TEXT    NOT NULL,
        created_at  TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS visitors (
        id          TEXT    PRIMARY KEY NOT NULL,
        created_at  TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS labels (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        joke_id       INTEGER NOT NULL REFERENCES jokes(id),
        visitor_id    TEXT    NOT NULL REFERENCES visitors(id),
        no_punchline  BOOLEAN NOT NULL DEFAULT 0,
        created_at    TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS label_segments (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        label_id     INTEGER NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
        start_index  INTEGER NOT NULL,
        end_index    INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_labels_joke ON labels(joke_id)",
    "CREATE INDEX IF NOT EXISTS idx_labels_visitor_joke ON labels(visitor_id, joke_id)",
    "CREATE INDEX IF NOT EXISTS idx_label_segments_label ON label_segments(label_id)",
];

// Eligible jokes ranked by their total label count; absent counts are zero.
const LEAST_LABELED_BASE: &str = "
    SELECT j.id, j.text, j.created_at
    FROM jokes j
    LEFT JOIN (
        SELECT joke_id, COUNT(id) AS label_count
        FROM labels
        GROUP BY joke_id
    ) c ON c.joke_id = j.id
    WHERE NOT EXISTS (
        SELECT 1 FROM labels l WHERE l.joke_id = j.id AND l.visitor_id = ?
    )
    ORDER BY COALESCE(c.label_count, 0) ASC, ";

pub(crate) fn least_labeled_query(random: bool) -> String {
    let tie_break = if random { "RANDOM()" } else { "j.id ASC" };
    format!("{LEAST_LABELED_BASE}{tie_break} LIMIT 1")
}
