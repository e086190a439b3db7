use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            email           TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            role            TEXT NOT NULL CHECK (role IN ('customer', 'vendor', 'admin')),
            first_name      TEXT,
            last_name       TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS vendors (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL UNIQUE REFERENCES users(id),
            business_name   TEXT NOT NULL,
            vat_number      TEXT,
            city            TEXT,
            is_verified     INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS listings (
            id              TEXT PRIMARY KEY,
            vendor_id       TEXT NOT NULL REFERENCES vendors(id),
            title           TEXT NOT NULL,
            description     TEXT,
            city            TEXT,
            contact_email   TEXT,
            contact_phone   TEXT,
            opening_hours   TEXT,
            status          TEXT NOT NULL DEFAULT 'draft'
                            CHECK (status IN ('draft', 'submitted', 'active', 'rejected')),
            image_url       TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_listings_vendor
            ON listings(vendor_id);
        CREATE INDEX IF NOT EXISTS idx_listings_status
            ON listings(status);

        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            is_active   INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS listing_categories (
            listing_id  TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            PRIMARY KEY (listing_id, category_id)
        );

        CREATE TABLE IF NOT EXISTS favorites (
            user_id     TEXT NOT NULL REFERENCES users(id),
            listing_id  TEXT NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, listing_id)
        );

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            recipient_id    TEXT NOT NULL REFERENCES users(id),
            listing_id      TEXT REFERENCES listings(id) ON DELETE SET NULL,
            subject         TEXT,
            content         TEXT NOT NULL,
            read            INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_id, read);
        CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id);

        -- Read-optimized projections. Public visibility is defined here:
        -- a listing appears publicly iff status = 'active'.
        CREATE VIEW IF NOT EXISTS public_listings_view AS
            SELECT
                l.id            AS listing_id,
                l.vendor_id     AS vendor_id,
                v.business_name AS business_name,
                v.is_verified   AS is_verified,
                l.title         AS title,
                l.description   AS description,
                l.city          AS city,
                l.contact_email AS contact_email,
                l.contact_phone AS contact_phone,
                l.opening_hours AS opening_hours,
                l.image_url     AS image_url,
                -- char(31) (unit separator) keeps commas in names intact
                (SELECT group_concat(c.name, char(31))
                 FROM listing_categories lc
                 JOIN categories c ON c.id = lc.category_id
                 WHERE lc.listing_id = l.id) AS categories,
                l.created_at    AS created_at,
                l.updated_at    AS updated_at
            FROM listings l
            JOIN vendors v ON l.vendor_id = v.id
            WHERE l.status = 'active';

        CREATE VIEW IF NOT EXISTS vendor_listings_view AS
            SELECT
                l.id            AS listing_id,
                l.vendor_id     AS vendor_id,
                v.user_id       AS vendor_user_id,
                v.business_name AS business_name,
                l.title         AS title,
                l.description   AS description,
                l.city          AS city,
                l.contact_email AS contact_email,
                l.contact_phone AS contact_phone,
                l.opening_hours AS opening_hours,
                l.status        AS status,
                l.image_url     AS image_url,
                l.created_at    AS created_at,
                l.updated_at    AS updated_at
            FROM listings l
            JOIN vendors v ON l.vendor_id = v.id;

        CREATE VIEW IF NOT EXISTS user_favorites_view AS
            SELECT
                f.user_id       AS user_id,
                f.listing_id    AS listing_id,
                f.created_at    AS favorited_at,
                l.title         AS title,
                l.city          AS city,
                l.status        AS status,
                l.image_url     AS image_url,
                v.business_name AS business_name
            FROM favorites f
            JOIN listings l ON f.listing_id = l.id
            JOIN vendors v ON l.vendor_id = v.id;

        -- Seed the static category list
        INSERT OR IGNORE INTO categories (id, name) VALUES
            ('00000000-0000-0000-0000-000000000001', 'Plumber'),
            ('00000000-0000-0000-0000-000000000002', 'Electrician'),
            ('00000000-0000-0000-0000-000000000003', 'Bakery'),
            ('00000000-0000-0000-0000-000000000004', 'Restaurant'),
            ('00000000-0000-0000-0000-000000000005', 'Hairdresser'),
            ('00000000-0000-0000-0000-000000000006', 'Garden & Landscaping');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
