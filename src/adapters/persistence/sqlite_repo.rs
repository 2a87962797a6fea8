//! SQLite-backed repository via libsql. Implements ProfilePort and EventStorePort.
//!
//! One database file (data/weekwise.db). `profiles` holds the premium flag and the
//! AI usage counter; `events` holds each user's saved week in display order.
//! The usage counter only moves through single conditional UPDATEs.
//!
//! Every call opens its own connection, so each one waits on the write lock
//! for up to `BUSY_TIMEOUT` instead of failing with `database is locked`.

use crate::domain::{CalendarEvent, DomainError, EventType, Profile, SlotAttempt, Weekday};
use crate::ports::{EventStorePort, ProfilePort};
use libsql::{Connection, Database, TransactionBehavior, params};
use std::path::Path;
use std::time::Duration;
use tracing::info;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PROFILES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    is_premium INTEGER NOT NULL DEFAULT 0,
    ai_usage_count INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL
)"#;

const EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    user_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    title TEXT NOT NULL,
    type TEXT NOT NULL,
    day TEXT NOT NULL,
    start_hour INTEGER NOT NULL,
    duration REAL NOT NULL,
    PRIMARY KEY (user_id, position)
)"#;

fn repo_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Repo(e.to_string())
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

/// SQLite repository. Safe to share via Arc; each call opens its own connection.
pub struct SqliteRepo {
    db: Database,
}

impl SqliteRepo {
    /// Connect to (or create) the database in `base_dir` and ensure the schema exists.
    ///
    /// Sets WAL mode and synchronous=NORMAL.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(repo_err)?;
        let db_path = base.join("weekwise.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(repo_err)?;
        let conn = Self::open(&db)?;

        // PRAGMA returns a row; execute() fails on rows, so drain a query instead.
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows.next().await.map_err(repo_err)?.is_some() {}
        }

        conn.execute(PROFILES_TABLE, ()).await.map_err(repo_err)?;
        conn.execute(EVENTS_TABLE, ()).await.map_err(repo_err)?;

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db })
    }

    fn open(db: &Database) -> Result<Connection, DomainError> {
        let conn = db.connect().map_err(repo_err)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(repo_err)?;
        Ok(conn)
    }

    fn conn(&self) -> Result<Connection, DomainError> {
        Self::open(&self.db)
    }

    async fn ensure_profile(conn: &Connection, user_id: &str) -> Result<(), DomainError> {
        conn.execute(
            "INSERT INTO profiles (id, is_premium, ai_usage_count, updated_at) VALUES (?1, 0, 0, ?2) ON CONFLICT (id) DO NOTHING",
            params![user_id, now_secs()],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn read_profile(conn: &Connection, user_id: &str) -> Result<Profile, DomainError> {
        let mut rows = conn
            .query(
                "SELECT is_premium, ai_usage_count FROM profiles WHERE id = ?1",
                params![user_id],
            )
            .await
            .map_err(repo_err)?;
        let row = rows
            .next()
            .await
            .map_err(repo_err)?
            .ok_or_else(|| DomainError::Repo(format!("profile {} not found", user_id)))?;
        let is_premium: i64 = row.get(0).map_err(repo_err)?;
        let usage: i64 = row.get(1).map_err(repo_err)?;
        Ok(Profile {
            user_id: user_id.to_string(),
            is_premium: is_premium != 0,
            ai_usage_count: u32::try_from(usage).unwrap_or(0),
        })
    }
}

#[async_trait::async_trait]
impl ProfilePort for SqliteRepo {
    async fn get_or_create_profile(&self, user_id: &str) -> Result<Profile, DomainError> {
        let conn = self.conn()?;
        Self::ensure_profile(&conn, user_id).await?;
        Self::read_profile(&conn, user_id).await
    }

    async fn try_reserve_usage(
        &self,
        user_id: &str,
        free_limit: u32,
    ) -> Result<SlotAttempt, DomainError> {
        let conn = self.conn()?;
        Self::ensure_profile(&conn, user_id).await?;

        // Check and increment in one statement; no row back means premium or exhausted.
        let mut rows = conn
            .query(
                r#"
                UPDATE profiles
                SET ai_usage_count = ai_usage_count + 1, updated_at = ?3
                WHERE id = ?1 AND is_premium = 0 AND ai_usage_count < ?2
                RETURNING ai_usage_count
                "#,
                params![user_id, i64::from(free_limit), now_secs()],
            )
            .await
            .map_err(repo_err)?;
        let updated = rows.next().await.map_err(repo_err)?;
        if let Some(row) = updated {
            let usage_after: i64 = row.get(0).map_err(repo_err)?;
            while rows.next().await.map_err(repo_err)?.is_some() {}
            return Ok(SlotAttempt::Taken {
                usage_after: u32::try_from(usage_after).unwrap_or(u32::MAX),
            });
        }
        drop(rows);

        Ok(SlotAttempt::Refused(
            Self::read_profile(&conn, user_id).await?,
        ))
    }

    async fn release_usage(&self, user_id: &str) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE profiles SET ai_usage_count = ai_usage_count - 1, updated_at = ?2 WHERE id = ?1 AND ai_usage_count > 0",
            params![user_id, now_secs()],
        )
        .await
        .map_err(repo_err)?;
        Ok(())
    }

    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO profiles (id, is_premium, ai_usage_count, updated_at)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT (id) DO UPDATE SET
                is_premium = excluded.is_premium,
                updated_at = excluded.updated_at
            "#,
            params![user_id, i64::from(is_premium), now_secs()],
        )
        .await
        .map_err(repo_err)?;
        info!(user_id, is_premium, "premium flag updated");
        Ok(())
    }
}

#[async_trait::async_trait]
impl EventStorePort for SqliteRepo {
    async fn load_events(&self, user_id: &str) -> Result<Vec<CalendarEvent>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query(
                r#"
                SELECT title, type, day, start_hour, duration
                FROM events
                WHERE user_id = ?1
                ORDER BY position ASC
                "#,
                params![user_id],
            )
            .await
            .map_err(repo_err)?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await.map_err(repo_err)? {
            let title: String = row.get(0).map_err(repo_err)?;
            let kind: String = row.get(1).map_err(repo_err)?;
            let day: String = row.get(2).map_err(repo_err)?;
            let start_hour: i64 = row.get(3).map_err(repo_err)?;
            let duration: f64 = row.get(4).map_err(repo_err)?;
            events.push(CalendarEvent {
                title,
                kind: EventType::parse(&kind)
                    .ok_or_else(|| DomainError::Repo(format!("unknown event type {:?}", kind)))?,
                day: Weekday::parse(&day)
                    .ok_or_else(|| DomainError::Repo(format!("unknown day {:?}", day)))?,
                start_hour: u8::try_from(start_hour).map_err(repo_err)?,
                duration,
            });
        }
        Ok(events)
    }

    async fn replace_events(
        &self,
        user_id: &str,
        events: &[CalendarEvent],
    ) -> Result<(), DomainError> {
        let conn = self.conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(repo_err)?;
        tx.execute("DELETE FROM events WHERE user_id = ?1", params![user_id])
            .await
            .map_err(repo_err)?;
        for (position, e) in events.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO events (user_id, position, title, type, day, start_hour, duration)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    user_id,
                    position as i64,
                    e.title.as_str(),
                    e.kind.as_str(),
                    e.day.as_str(),
                    i64::from(e.start_hour),
                    e.duration
                ],
            )
            .await
            .map_err(repo_err)?;
        }
        tx.commit().await.map_err(repo_err)?;
        Ok(())
    }
}
