use anyhow::Result;

use crate::models::FavoriteListingRow;
use crate::Database;

impl Database {
    /// Idempotent: favoriting an already-favorited listing is a no-op.
    /// Returns whether a row was actually inserted.
    pub fn add_favorite(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO favorites (user_id, listing_id) VALUES (?1, ?2)",
                rusqlite::params![user_id, listing_id],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Returns whether a row was actually deleted; removing a non-favorite
    /// is not an error.
    pub fn remove_favorite(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM favorites WHERE user_id = ?1 AND listing_id = ?2",
                rusqlite::params![user_id, listing_id],
            )?;
            Ok(deleted > 0)
        })
    }

    pub fn is_favorited(&self, user_id: &str, listing_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = ?1 AND listing_id = ?2)",
                rusqlite::params![user_id, listing_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn get_favorites(&self, user_id: &str) -> Result<Vec<FavoriteListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, listing_id, favorited_at, title, city, status, image_url, business_name
                 FROM user_favorites_view
                 WHERE user_id = ?1
                 ORDER BY favorited_at DESC",
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(FavoriteListingRow {
                        user_id: row.get(0)?,
                        listing_id: row.get(1)?,
                        favorited_at: row.get(2)?,
                        title: row.get(3)?,
                        city: row.get(4)?,
                        status: row.get(5)?,
                        image_url: row.get(6)?,
                        business_name: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
