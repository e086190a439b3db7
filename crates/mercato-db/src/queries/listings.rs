use anyhow::Result;
use rusqlite::{Connection, types::ToSql};

use super::OptionalExt;
use crate::models::{ListingOwnerRow, ListingUpdate, NewListing, PublicListingRow, VendorListingRow};
use crate::Database;

/// Public browse filters. City and search are substring matches, category is
/// an exact category-name match.
#[derive(Debug, Default)]
pub struct ListingFilters {
    pub city: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl Database {
    /// Inserts the listing and its category links in one transaction so a
    /// failed link insert never leaves a listing without its categories.
    /// New listings always start in 'draft'.
    pub fn create_listing(&self, listing: &NewListing, category_ids: &[String]) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO listings
                    (id, vendor_id, title, description, city, contact_email, contact_phone, opening_hours, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'draft')",
                rusqlite::params![
                    listing.id,
                    listing.vendor_id,
                    listing.title,
                    listing.description,
                    listing.city,
                    listing.contact_email,
                    listing.contact_phone,
                    listing.opening_hours
                ],
            )?;
            insert_category_links(&tx, listing.id, category_ids)?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_public_listings(&self, filters: &ListingFilters) -> Result<Vec<PublicListingRow>> {
        self.with_conn(|conn| query_public_listings(conn, filters))
    }

    pub fn get_public_listing(&self, id: &str) -> Result<Option<PublicListingRow>> {
        self.with_conn(|conn| {
            let sql = format!("{PUBLIC_SELECT} WHERE listing_id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_public_row).optional()?;
            Ok(row)
        })
    }

    /// All of a vendor's listings regardless of status, newest first.
    pub fn get_vendor_listings(&self, vendor_user_id: &str) -> Result<Vec<VendorListingRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VENDOR_SELECT} WHERE vendor_user_id = ?1 ORDER BY created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([vendor_user_id], map_vendor_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_vendor_listing(&self, id: &str) -> Result<Option<VendorListingRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VENDOR_SELECT} WHERE listing_id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_vendor_row).optional()?;
            Ok(row)
        })
    }

    /// Admin view: every listing with vendor info, newest first.
    pub fn get_all_listings(&self) -> Result<Vec<VendorListingRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VENDOR_SELECT} ORDER BY created_at DESC");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_vendor_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Ownership/status projection used by write paths before touching a row.
    pub fn get_listing_owner(&self, id: &str) -> Result<Option<ListingOwnerRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT l.id, l.vendor_id, v.user_id, l.status
                 FROM listings l
                 JOIN vendors v ON l.vendor_id = v.id
                 WHERE l.id = ?1",
            )?;
            let row = stmt
                .query_row([id], |row| {
                    Ok(ListingOwnerRow {
                        id: row.get(0)?,
                        vendor_id: row.get(1)?,
                        vendor_user_id: row.get(2)?,
                        status: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    /// Whitelist-copies the provided fields and replaces category links when
    /// given, all in one transaction. Bumps updated_at.
    pub fn update_listing(&self, id: &str, update: &ListingUpdate) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let mut sets: Vec<&str> = Vec::new();
            let mut values: Vec<&dyn ToSql> = Vec::new();

            if let Some(v) = &update.title {
                sets.push("title = ?");
                values.push(v);
            }
            if let Some(v) = &update.description {
                sets.push("description = ?");
                values.push(v);
            }
            if let Some(v) = &update.city {
                sets.push("city = ?");
                values.push(v);
            }
            if let Some(v) = &update.contact_email {
                sets.push("contact_email = ?");
                values.push(v);
            }
            if let Some(v) = &update.contact_phone {
                sets.push("contact_phone = ?");
                values.push(v);
            }
            if let Some(v) = &update.opening_hours {
                sets.push("opening_hours = ?");
                values.push(v);
            }
            if let Some(v) = &update.image_url {
                sets.push("image_url = ?");
                values.push(v);
            }
            if let Some(v) = &update.status {
                sets.push("status = ?");
                values.push(v);
            }

            if !sets.is_empty() {
                let assignments: Vec<String> = sets
                    .iter()
                    .enumerate()
                    .map(|(i, s)| s.replace('?', &format!("?{}", i + 1)))
                    .collect();
                let sql = format!(
                    "UPDATE listings SET {}, updated_at = datetime('now') WHERE id = ?{}",
                    assignments.join(", "),
                    sets.len() + 1
                );
                values.push(&id);
                tx.execute(&sql, values.as_slice())?;
            } else {
                tx.execute(
                    "UPDATE listings SET updated_at = datetime('now') WHERE id = ?1",
                    [id],
                )?;
            }

            if let Some(category_ids) = &update.category_ids {
                tx.execute("DELETE FROM listing_categories WHERE listing_id = ?1", [id])?;
                insert_category_links(&tx, id, category_ids)?;
            }

            tx.commit()?;
            Ok(())
        })
    }

    /// Unguarded status write; transition validity is enforced by the caller.
    pub fn update_listing_status(&self, id: &str, status: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE listings SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            Ok(())
        })
    }

    /// Category links and favorites cascade; messages keep their body with
    /// listing_id nulled out by the foreign key.
    pub fn delete_listing(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM listings WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

const PUBLIC_SELECT: &str = "SELECT listing_id, vendor_id, business_name, is_verified, title, \
     description, city, contact_email, contact_phone, opening_hours, image_url, categories, \
     created_at, updated_at FROM public_listings_view";

const VENDOR_SELECT: &str = "SELECT listing_id, vendor_id, vendor_user_id, business_name, title, \
     description, city, contact_email, contact_phone, opening_hours, status, image_url, \
     created_at, updated_at FROM vendor_listings_view";

fn query_public_listings(conn: &Connection, filters: &ListingFilters) -> Result<Vec<PublicListingRow>> {
    let mut sql = format!("{PUBLIC_SELECT} WHERE 1=1");
    let mut params: Vec<&dyn ToSql> = Vec::new();
    let mut n = 0;

    if let Some(city) = &filters.city {
        n += 1;
        sql.push_str(&format!(" AND city LIKE '%' || ?{n} || '%'"));
        params.push(city);
    }
    if let Some(category) = &filters.category {
        n += 1;
        sql.push_str(&format!(
            " AND EXISTS (SELECT 1 FROM listing_categories lc \
             JOIN categories c ON c.id = lc.category_id \
             WHERE lc.listing_id = public_listings_view.listing_id AND c.name = ?{n})"
        ));
        params.push(category);
    }
    if let Some(search) = &filters.search {
        n += 1;
        sql.push_str(&format!(
            " AND (title LIKE '%' || ?{n} || '%' OR description LIKE '%' || ?{n} || '%')"
        ));
        params.push(search);
    }

    sql.push_str(" ORDER BY created_at DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params.as_slice(), map_public_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn insert_category_links(conn: &Connection, listing_id: &str, category_ids: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO listing_categories (listing_id, category_id) VALUES (?1, ?2)",
    )?;
    for category_id in category_ids {
        stmt.execute(rusqlite::params![listing_id, category_id])?;
    }
    Ok(())
}

fn map_public_row(row: &rusqlite::Row<'_>) -> std::result::Result<PublicListingRow, rusqlite::Error> {
    Ok(PublicListingRow {
        listing_id: row.get(0)?,
        vendor_id: row.get(1)?,
        business_name: row.get(2)?,
        is_verified: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        city: row.get(6)?,
        contact_email: row.get(7)?,
        contact_phone: row.get(8)?,
        opening_hours: row.get(9)?,
        image_url: row.get(10)?,
        categories: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn map_vendor_row(row: &rusqlite::Row<'_>) -> std::result::Result<VendorListingRow, rusqlite::Error> {
    Ok(VendorListingRow {
        listing_id: row.get(0)?,
        vendor_id: row.get(1)?,
        vendor_user_id: row.get(2)?,
        business_name: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        city: row.get(6)?,
        contact_email: row.get(7)?,
        contact_phone: row.get(8)?,
        opening_hours: row.get(9)?,
        status: row.get(10)?,
        image_url: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}
