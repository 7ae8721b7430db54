//! Relational store for users and deals.
//!
//! SQLite-backed. Location: `[database] path` from the config, by default
//! ~/.local/share/dealpulse/deals.db.

use crate::deal::{Deal, DealStatus, UserSettingsRow};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Reads and writes the sweep needs from the store
pub trait DealStore: Send + Sync {
    /// Users with a non-null `deal_automation_settings` blob
    fn automation_users(&self) -> Result<Vec<UserSettingsRow>, StoreError>;

    /// A user's open and stalled deals. Won and lost deals are never returned.
    fn scored_deals_for_user(&self, user_id: &str) -> Result<Vec<Deal>, StoreError>;

    /// Persist a new health score. `last_decay_at = None` keeps the stored
    /// clock. Never touches `updated_at`.
    fn update_health_score(
        &self,
        deal_id: &str,
        health_score: i64,
        last_decay_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;
}

/// Deal store backed by SQLite
pub struct SqliteDealStore {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl SqliteDealStore {
    /// Open or create the store at a specific path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening deal database at: {}", path.display());
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Private in-memory store, used by tests and previews of fixtures
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Create tables and indexes if absent
    pub fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL DEFAULT '',
                deal_automation_settings TEXT
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS deals (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                health_score INTEGER,
                status TEXT NOT NULL DEFAULT 'open',
                updated_at TEXT NOT NULL,
                last_decay_at TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_deals_user_status ON deals(user_id, status)",
            [],
        )?;

        Ok(())
    }

    /// Insert or replace a user row. `settings_json = None` stores SQL NULL.
    pub fn upsert_user(
        &self,
        id: &str,
        email: &str,
        settings_json: Option<&str>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO users (id, email, deal_automation_settings) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                deal_automation_settings = excluded.deal_automation_settings
            "#,
            params![id, email, settings_json],
        )?;
        Ok(())
    }

    /// Insert or replace a deal row
    pub fn upsert_deal(&self, deal: &Deal) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO deals
                (id, user_id, name, health_score, status, updated_at, last_decay_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                &deal.id,
                &deal.user_id,
                &deal.name,
                deal.health_score,
                deal.status.as_str(),
                deal.updated_at,
                deal.last_decay_at
            ],
        )?;
        Ok(())
    }

    /// Fetch a deal by id regardless of status
    pub fn deal(&self, deal_id: &str) -> Result<Option<Deal>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT id, user_id, name, health_score, status, updated_at, last_decay_at
                 FROM deals WHERE id = ?1",
                params![deal_id],
                RawDeal::from_row,
            )
            .optional()?;
        raw.map(RawDeal::into_deal).transpose()
    }
}

impl DealStore for SqliteDealStore {
    fn automation_users(&self) -> Result<Vec<UserSettingsRow>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, deal_automation_settings FROM users
             WHERE deal_automation_settings IS NOT NULL
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UserSettingsRow {
                    id: row.get(0)?,
                    raw_settings: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} users with automation settings", rows.len());
        Ok(rows)
    }

    fn scored_deals_for_user(&self, user_id: &str) -> Result<Vec<Deal>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, health_score, status, updated_at, last_decay_at
             FROM deals
             WHERE user_id = ?1 AND status IN ('open', 'stalled')
             ORDER BY id",
        )?;
        let raw = stmt
            .query_map(params![user_id], RawDeal::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawDeal::into_deal).collect()
    }

    fn update_health_score(
        &self,
        deal_id: &str,
        health_score: i64,
        last_decay_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE deals SET
                health_score = ?1,
                last_decay_at = COALESCE(?2, last_decay_at)
             WHERE id = ?3",
            params![health_score, last_decay_at, deal_id],
        )?;
        if updated == 0 {
            return Err(StoreError::DealNotFound(deal_id.to_string()));
        }
        Ok(())
    }
}

/// Row as read, before the status text is checked
struct RawDeal {
    id: String,
    user_id: String,
    name: String,
    health_score: Option<i64>,
    status: String,
    updated_at: DateTime<Utc>,
    last_decay_at: Option<DateTime<Utc>>,
}

impl RawDeal {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            health_score: row.get(3)?,
            status: row.get(4)?,
            updated_at: row.get(5)?,
            last_decay_at: row.get(6)?,
        })
    }

    fn into_deal(self) -> Result<Deal, StoreError> {
        let status: DealStatus = self.status.parse()?;
        Ok(Deal {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            health_score: self.health_score,
            status,
            updated_at: self.updated_at,
            last_decay_at: self.last_decay_at,
        })
    }
}
