use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// One image in an artist's library or portfolio. Identity is the `slug`,
/// derived from the storage locator (see `media::parse_image_url`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageRecord {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Artist {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub website: Option<String>,
    /// Locator of the profile photo, or the configured default-photo url when unset.
    #[serde(default)]
    pub artist_photo: String,
    /// Every image the artist has uploaded, in upload order. Slugs unique.
    #[serde(default)]
    pub images: Vec<ImageRecord>,
    /// The curated portfolio: ordered references into `images` by slug.
    #[serde(default)]
    pub gallery: Vec<ImageRecord>,
    #[serde(default)]
    pub display_type: String,
    /// New records start hidden until the artist is ready to go public.
    #[serde(default = "default_true")]
    pub hidden: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

fn default_true() -> bool {
    true
}

impl Artist {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let images_json: String = row.get("images")?;
        let gallery_json: String = row.get("gallery")?;
        let hidden_raw: i64 = row.get("hidden")?;
        let blocked_raw: i64 = row.get("blocked")?;
        Ok(Artist {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            name: row.get("name")?,
            title: row.get("title")?,
            website: row.get("website")?,
            artist_photo: row.get("artist_photo")?,
            images: serde_json::from_str(&images_json).unwrap_or_default(),
            gallery: serde_json::from_str(&gallery_json).unwrap_or_default(),
            display_type: row.get("display_type")?,
            hidden: hidden_raw != 0,
            blocked: blocked_raw != 0,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM artists WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_owner(pool: &DbPool, owner_id: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM artists WHERE owner_id = ?1",
            params![owner_id],
            Self::from_row,
        )
        .ok()
    }

    pub fn count_by_owner(pool: &DbPool, owner_id: &str) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row(
            "SELECT COUNT(*) FROM artists WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )
        .unwrap_or(0)
    }

    /// All records visible in the public gallery (not hidden, not blocked).
    pub fn list_visible(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM artists WHERE hidden = 0 AND blocked = 0 ORDER BY name")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn insert(pool: &DbPool, artist: &Artist) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let images = serde_json::to_string(&artist.images).map_err(|e| e.to_string())?;
        let gallery = serde_json::to_string(&artist.gallery).map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO artists (id, owner_id, name, title, website, artist_photo,
             images, gallery, display_type, hidden, blocked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                artist.id,
                artist.owner_id,
                artist.name,
                artist.title,
                artist.website,
                artist.artist_photo,
                images,
                gallery,
                artist.display_type,
                artist.hidden as i64,
                artist.blocked as i64,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update(pool: &DbPool, artist: &Artist) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let images = serde_json::to_string(&artist.images).map_err(|e| e.to_string())?;
        let gallery = serde_json::to_string(&artist.gallery).map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE artists SET name=?1, title=?2, website=?3, artist_photo=?4,
             images=?5, gallery=?6, display_type=?7, hidden=?8, blocked=?9,
             updated_at=CURRENT_TIMESTAMP WHERE id=?10",
            params![
                artist.name,
                artist.title,
                artist.website,
                artist.artist_photo,
                images,
                gallery,
                artist.display_type,
                artist.hidden as i64,
                artist.blocked as i64,
                artist.id,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Partial write of the image library only. Last-write-wins on this field.
    pub fn update_images(pool: &DbPool, id: &str, images: &[ImageRecord]) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let json = serde_json::to_string(images).map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE artists SET images = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![json, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Partial write of the portfolio only.
    pub fn update_gallery(pool: &DbPool, id: &str, gallery: &[ImageRecord]) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let json = serde_json::to_string(gallery).map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE artists SET gallery = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![json, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn update_photo(pool: &DbPool, id: &str, artist_photo: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE artists SET artist_photo = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
            params![artist_photo, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}

// ── Portfolio ordering ──────────────────────────────────

/// Swap the entry at `ix` with its predecessor. No-op at index 0 or out of range.
pub fn move_up(portfolio: &mut Vec<ImageRecord>, ix: usize) -> bool {
    if ix > 0 && ix < portfolio.len() {
        portfolio.swap(ix, ix - 1);
        true
    } else {
        false
    }
}

/// Swap the entry at `ix` with its successor. No-op at the last index or out of range.
pub fn move_down(portfolio: &mut Vec<ImageRecord>, ix: usize) -> bool {
    if ix + 1 < portfolio.len() {
        portfolio.swap(ix, ix + 1);
        true
    } else {
        false
    }
}

/// Delete the entry at `ix`. Remaining entries keep their relative order.
pub fn remove_at(portfolio: &mut Vec<ImageRecord>, ix: usize) -> bool {
    if ix < portfolio.len() {
        portfolio.remove(ix);
        true
    } else {
        false
    }
}

/// Whether the portfolio has room for another image.
pub fn can_add_more(len: usize, max: usize) -> bool {
    len < max
}

/// Prepend the library image matching `slug` to the portfolio, if the portfolio
/// has room and doesn't already contain it.
pub fn add_to_portfolio(
    images: &[ImageRecord],
    portfolio: &mut Vec<ImageRecord>,
    slug: &str,
    max: usize,
) -> bool {
    if !can_add_more(portfolio.len(), max) {
        return false;
    }
    let image = match images.iter().find(|img| img.slug == slug) {
        Some(img) => img.clone(),
        None => return false,
    };
    if portfolio.iter().any(|p| p.slug == slug) {
        return false;
    }
    portfolio.insert(0, image);
    true
}
