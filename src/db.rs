use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file("data/db/galerie.db");
    let pool = Pool::builder().max_size(10).build(manager)?;

    // Enable WAL mode for better concurrent read performance
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Artist gallery records. The image library and portfolio are stored
        -- as JSON arrays of image records keyed by slug.
        CREATE TABLE IF NOT EXISTS artists (
            id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            title TEXT NOT NULL DEFAULT '',
            website TEXT,
            artist_photo TEXT NOT NULL DEFAULT '',
            images TEXT NOT NULL DEFAULT '[]',
            gallery TEXT NOT NULL DEFAULT '[]',
            display_type TEXT NOT NULL DEFAULT 'thumbnails',
            hidden INTEGER NOT NULL DEFAULT 1,
            blocked INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_artists_owner ON artists(owner_id);

        -- Entry fee / donation orders
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY,
            uuid TEXT UNIQUE NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            amount REAL NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            provider TEXT NOT NULL DEFAULT 'paypal',
            provider_order_id TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT 'pending',
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Key/value site configuration
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults: &[(&str, &str)] = &[
        // Gallery
        (
            "gallery_default_photo",
            "image://v1/a0c4f2_5f6d3e8b90a14c7d8e21b3a4c5d6e7f8~mv2.png/stick-figure.png#originWidth=248&originHeight=209",
        ),
        ("gallery_max_portfolio", "10"),
        ("gallery_max_uploads", "50"),
        // Uploads
        ("uploads_dir", "data/uploads/"),
        ("uploads_max_mb", "25"),
        // Checkout
        ("checkout_default_fee", "10"),
        ("commerce_currency", "USD"),
        ("commerce_paypal_enabled", "false"),
        ("paypal_client_id", ""),
        ("paypal_secret", ""),
        ("paypal_mode", "sandbox"),
        // Site
        ("site_url", "http://localhost:8000"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
    }

    Ok(())
}
