use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// An entry-fee/donation order. `amount` is the composed item total;
/// `provider_order_id` is filled in once the payment provider confirms.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub uuid: String,
    pub description: String,
    pub amount: f64,
    pub currency: String,
    pub provider: String,
    pub provider_order_id: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

impl Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get("id")?,
            uuid: row.get("uuid")?,
            description: row
                .get::<_, Option<String>>("description")?
                .unwrap_or_default(),
            amount: row.get("amount")?,
            currency: row.get("currency")?,
            provider: row.get("provider")?,
            provider_order_id: row
                .get::<_, Option<String>>("provider_order_id")?
                .unwrap_or_default(),
            status: row.get("status")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_uuid(pool: &DbPool, uuid: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM orders WHERE uuid = ?1",
            params![uuid],
            Self::from_row,
        )
        .ok()
    }

    pub fn list(pool: &DbPool, limit: i64, offset: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM orders ORDER BY created_at DESC LIMIT ?1 OFFSET ?2")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![limit, offset], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Create a pending order; returns its uuid.
    pub fn create(
        pool: &DbPool,
        description: &str,
        amount: f64,
        currency: &str,
        provider: &str,
    ) -> Result<String, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let uuid = uuid::Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO orders (uuid, description, amount, currency, provider, status)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending')",
            params![uuid, description, amount, currency, provider],
        )
        .map_err(|e| e.to_string())?;
        Ok(uuid)
    }

    pub fn update_status(pool: &DbPool, uuid: &str, status: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE orders SET status = ?1 WHERE uuid = ?2",
            params![status, uuid],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update_provider_order_id(
        pool: &DbPool,
        uuid: &str,
        provider_order_id: &str,
    ) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE orders SET provider_order_id = ?1 WHERE uuid = ?2",
            params![provider_order_id, uuid],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}
