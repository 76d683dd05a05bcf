//! SQLite-backed card, review and learner storage.
//!
//! One connection behind a mutex serves all three traits. Timestamps are
//! stored as fixed-width RFC 3339 text (microseconds, `Z` suffix) so range
//! comparisons can be done on the text column directly.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{LexicardError, LexicardResult};
use crate::traits::{CardStore, LearnerStore, ReviewLog};
use crate::types::{
    BestDay, Card, CardId, ChatId, Learner, LearnerId, NewCard, NewReview, Review,
    DEFAULT_REMINDER_INTERVAL_MINUTES,
};

const CARD_COLUMNS: &str = "id, learner_id, term, translation, transcription, example, level, \
     learned, next_review_at, created_at, last_review_at, total_reviews, correct_reviews";

const LEARNER_COLUMNS: &str = "id, chat_id, username, created_at, reminder_interval_minutes, \
     next_reminder_at, hide_translations, last_summary_on";

const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite store for cards, reviews and learners.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    default_reminder_interval_minutes: i32,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> LexicardResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> LexicardResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> LexicardResult<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            default_reminder_interval_minutes: DEFAULT_REMINDER_INTERVAL_MINUTES,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Reminder cadence given to learners created by [`LearnerStore::get_or_create`].
    pub fn with_default_reminder_interval(mut self, minutes: i32) -> Self {
        self.default_reminder_interval_minutes = minutes.max(1);
        self
    }

    fn conn(&self) -> LexicardResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LexicardError::database_connection(format!("connection lock poisoned: {}", e)))
    }

    fn init_schema(&self) -> LexicardResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS learners (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id INTEGER UNIQUE NOT NULL,
                username TEXT,
                created_at TEXT NOT NULL,
                reminder_interval_minutes INTEGER NOT NULL DEFAULT 60,
                hide_translations INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                learner_id INTEGER NOT NULL,
                term TEXT NOT NULL,
                translation TEXT NOT NULL,
                transcription TEXT NOT NULL DEFAULT '',
                example TEXT,
                level INTEGER NOT NULL DEFAULT 1,
                learned INTEGER NOT NULL DEFAULT 0,
                next_review_at TEXT,
                created_at TEXT NOT NULL,
                last_review_at TEXT,
                total_reviews INTEGER NOT NULL DEFAULT 0,
                correct_reviews INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (learner_id) REFERENCES learners(id)
            );

            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_id INTEGER NOT NULL,
                is_correct INTEGER NOT NULL,
                reviewed_at TEXT NOT NULL,
                FOREIGN KEY (card_id) REFERENCES cards(id)
            );

            CREATE INDEX IF NOT EXISTS idx_cards_learner ON cards(learner_id);
            CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards(next_review_at);
            CREATE INDEX IF NOT EXISTS idx_reviews_card ON reviews(card_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_time ON reviews(reviewed_at);
            "#,
        )?;

        // Reminder engine columns, added separately so older databases upgrade in place.
        ensure_column(&conn, "learners", "next_reminder_at", "TEXT")?;
        ensure_column(&conn, "learners", "last_summary_on", "TEXT")?;
        Ok(())
    }

    fn row_to_card(row: &Row<'_>) -> rusqlite::Result<Card> {
        Ok(Card {
            id: row.get(0)?,
            learner_id: row.get(1)?,
            term: row.get(2)?,
            translation: row.get(3)?,
            transcription: row.get(4)?,
            example: row.get(5)?,
            level: row.get(6)?,
            learned: row.get(7)?,
            next_review_at: opt_timestamp(row, 8)?,
            created_at: timestamp(row, 9)?,
            last_review_at: opt_timestamp(row, 10)?,
            total_reviews: row.get(11)?,
            correct_reviews: row.get(12)?,
        })
    }

    fn row_to_learner(row: &Row<'_>) -> rusqlite::Result<Learner> {
        let last_summary_on: Option<String> = row.get(7)?;
        Ok(Learner {
            id: row.get(0)?,
            chat_id: row.get(1)?,
            username: row.get(2)?,
            created_at: timestamp(row, 3)?,
            reminder_interval_minutes: row.get(4)?,
            next_reminder_at: opt_timestamp(row, 5)?,
            hide_translations: row.get(6)?,
            last_summary_on: last_summary_on
                .map(|s| {
                    NaiveDate::parse_from_str(&s, DAY_FORMAT)
                        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))
                })
                .transpose()?,
        })
    }

    fn query_cards(&self, sql: &str, params: impl rusqlite::Params) -> LexicardResult<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let cards = stmt
            .query_map(params, Self::row_to_card)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(card_read_error)?;
        Ok(cards)
    }

    fn query_learner(&self, sql: &str, params: impl rusqlite::Params) -> LexicardResult<Option<Learner>> {
        let conn = self.conn()?;
        Ok(conn.query_row(sql, params, Self::row_to_learner).optional()?)
    }
}

fn ensure_column(conn: &Connection, table: &str, column: &str, ty: &str) -> LexicardResult<()> {
    let exists: bool = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM pragma_table_info('{}') WHERE name = ?1",
            table
        ),
        params![column],
        |row| row.get::<_, i64>(0),
    )? > 0;

    if !exists {
        debug!(table, column, "Adding missing column");
        conn.execute(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ty), [])?;
    }
    Ok(())
}

/// Decoding failures on a card row mean the stored card is corrupt.
fn card_read_error(err: rusqlite::Error) -> LexicardError {
    match err {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            LexicardError::card_corrupted(err.to_string())
        }
        other => other.into(),
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        parse_timestamp(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// `[start, end)` of a UTC day as stored timestamps.
fn day_bounds(day: NaiveDate) -> (String, String) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (format_timestamp(start), format_timestamp(start + Duration::days(1)))
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn get_by_id(&self, id: CardId) -> LexicardResult<Option<Card>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM cards WHERE id = ?1", CARD_COLUMNS);
        conn.query_row(&sql, params![id], Self::row_to_card)
            .optional()
            .map_err(card_read_error)
    }

    async fn add(&self, card: NewCard) -> LexicardResult<Card> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO cards (learner_id, term, translation, transcription, example, level,
                                learned, next_review_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)",
            params![
                card.learner_id,
                card.term,
                card.translation,
                card.transcription,
                card.example,
                card.level,
                card.next_review_at.map(format_timestamp),
                format_timestamp(card.created_at),
            ],
        )?;
        let id = conn.last_insert_rowid();
        Ok(card.into_card(id))
    }

    async fn update(&self, card: &Card) -> LexicardResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE cards
             SET term = ?2, translation = ?3, transcription = ?4, example = ?5, level = ?6,
                 learned = ?7, next_review_at = ?8, last_review_at = ?9,
                 total_reviews = ?10, correct_reviews = ?11
             WHERE id = ?1",
            params![
                card.id,
                card.term,
                card.translation,
                card.transcription,
                card.example,
                card.level,
                card.learned,
                card.next_review_at.map(format_timestamp),
                card.last_review_at.map(format_timestamp),
                card.total_reviews,
                card.correct_reviews,
            ],
        )?;
        if changed == 0 {
            return Err(LexicardError::card_not_found(card.id));
        }
        Ok(())
    }

    async fn list_by_learner(&self, learner_id: LearnerId) -> LexicardResult<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM cards WHERE learner_id = ?1 ORDER BY created_at, id",
            CARD_COLUMNS
        );
        self.query_cards(&sql, params![learner_id])
    }

    async fn due_candidates(
        &self,
        learner_id: LearnerId,
        now: DateTime<Utc>,
    ) -> LexicardResult<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM cards
             WHERE learner_id = ?1 AND learned = 0
               AND (next_review_at IS NULL OR next_review_at <= ?2)
             ORDER BY next_review_at, id",
            CARD_COLUMNS
        );
        self.query_cards(&sql, params![learner_id, format_timestamp(now)])
    }

    async fn active_candidates(&self, learner_id: LearnerId) -> LexicardResult<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM cards WHERE learner_id = ?1 AND learned = 0 ORDER BY id",
            CARD_COLUMNS
        );
        self.query_cards(&sql, params![learner_id])
    }

    async fn delete_all_by_learner(&self, learner_id: LearnerId) -> LexicardResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM reviews WHERE card_id IN (SELECT id FROM cards WHERE learner_id = ?1)",
            params![learner_id],
        )?;
        let deleted = tx.execute("DELETE FROM cards WHERE learner_id = ?1", params![learner_id])?;
        tx.commit()?;
        Ok(deleted)
    }
}

#[async_trait]
impl ReviewLog for SqliteStore {
    async fn append(&self, review: NewReview) -> LexicardResult<Review> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO reviews (card_id, is_correct, reviewed_at) VALUES (?1, ?2, ?3)",
            params![
                review.card_id,
                review.is_correct,
                format_timestamp(review.reviewed_at)
            ],
        )?;
        Ok(review.into_review(conn.last_insert_rowid()))
    }

    async fn day_stats(&self, learner_id: LearnerId, day: NaiveDate) -> LexicardResult<(u32, u32)> {
        let conn = self.conn()?;
        let (start, end) = day_bounds(day);
        let stats = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(r.is_correct), 0)
             FROM reviews r
             INNER JOIN cards c ON r.card_id = c.id
             WHERE c.learner_id = ?1 AND r.reviewed_at >= ?2 AND r.reviewed_at < ?3",
            params![learner_id, start, end],
            |row| Ok((row.get::<_, u32>(0)?, row.get::<_, u32>(1)?)),
        )?;
        Ok(stats)
    }

    async fn best_day(&self, learner_id: LearnerId) -> LexicardResult<Option<BestDay>> {
        let conn = self.conn()?;
        let best = conn
            .query_row(
                "SELECT substr(r.reviewed_at, 1, 10) AS day, COUNT(*) AS n
                 FROM reviews r
                 INNER JOIN cards c ON r.card_id = c.id
                 WHERE c.learner_id = ?1
                 GROUP BY day
                 ORDER BY n DESC, day DESC
                 LIMIT 1",
                params![learner_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)),
            )
            .optional()?;

        best.map(|(day, reviews)| {
            NaiveDate::parse_from_str(&day, DAY_FORMAT)
                .map(|day| BestDay { day, reviews })
                .map_err(|e| LexicardError::database(format!("invalid review day '{}': {}", day, e)))
        })
        .transpose()
    }
}

#[async_trait]
impl LearnerStore for SqliteStore {
    async fn get_by_id(&self, id: LearnerId) -> LexicardResult<Option<Learner>> {
        let sql = format!("SELECT {} FROM learners WHERE id = ?1", LEARNER_COLUMNS);
        self.query_learner(&sql, params![id])
    }

    async fn get_by_chat(&self, chat_id: ChatId) -> LexicardResult<Option<Learner>> {
        let sql = format!("SELECT {} FROM learners WHERE chat_id = ?1", LEARNER_COLUMNS);
        self.query_learner(&sql, params![chat_id])
    }

    async fn get_or_create(
        &self,
        chat_id: ChatId,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> LexicardResult<Learner> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO learners (chat_id, username, created_at, reminder_interval_minutes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(chat_id) DO NOTHING",
            params![
                chat_id,
                username,
                format_timestamp(now),
                self.default_reminder_interval_minutes
            ],
        )?;
        let sql = format!("SELECT {} FROM learners WHERE chat_id = ?1", LEARNER_COLUMNS);
        Ok(conn.query_row(&sql, params![chat_id], Self::row_to_learner)?)
    }

    async fn update(&self, learner: &Learner) -> LexicardResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE learners
             SET username = ?2, reminder_interval_minutes = ?3, hide_translations = ?4
             WHERE id = ?1",
            params![
                learner.id,
                learner.username,
                learner.reminder_interval_minutes,
                learner.hide_translations,
            ],
        )?;
        if changed == 0 {
            return Err(LexicardError::learner_not_found(learner.id));
        }
        Ok(())
    }

    async fn list_all(&self) -> LexicardResult<Vec<Learner>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM learners ORDER BY id", LEARNER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let learners = stmt
            .query_map([], Self::row_to_learner)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(learners)
    }

    async fn set_next_reminder_at(
        &self,
        id: LearnerId,
        at: Option<DateTime<Utc>>,
    ) -> LexicardResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE learners SET next_reminder_at = ?2 WHERE id = ?1",
            params![id, at.map(format_timestamp)],
        )?;
        if changed == 0 {
            return Err(LexicardError::learner_not_found(id));
        }
        Ok(())
    }

    async fn set_last_summary_on(&self, id: LearnerId, day: NaiveDate) -> LexicardResult<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE learners SET last_summary_on = ?2 WHERE id = ?1",
            params![id, day.format(DAY_FORMAT).to_string()],
        )?;
        if changed == 0 {
            return Err(LexicardError::learner_not_found(id));
        }
        Ok(())
    }
}
