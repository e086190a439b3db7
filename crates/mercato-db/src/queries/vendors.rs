use anyhow::Result;
use rusqlite::Connection;

use super::users::insert_user;
use super::OptionalExt;
use crate::models::{NewUser, NewVendor, VendorRow};
use crate::Database;

impl Database {
    /// Vendor registration creates the user and its vendor profile in one
    /// transaction so a failed profile insert never leaves an orphaned user.
    pub fn create_vendor_account(&self, user: &NewUser, vendor: &NewVendor) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            insert_user(&tx, user)?;
            tx.execute(
                "INSERT INTO vendors (id, user_id, business_name, vat_number, city)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    vendor.id,
                    user.id,
                    vendor.business_name,
                    vendor.vat_number,
                    vendor.city
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_vendor_by_user_id(&self, user_id: &str) -> Result<Option<VendorRow>> {
        self.with_conn(|conn| query_vendor_by_user_id(conn, user_id))
    }
}

fn query_vendor_by_user_id(conn: &Connection, user_id: &str) -> Result<Option<VendorRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, business_name, vat_number, city, is_verified, created_at
         FROM vendors WHERE user_id = ?1",
    )?;

    let row = stmt
        .query_row([user_id], |row| {
            Ok(VendorRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                business_name: row.get(2)?,
                vat_number: row.get(3)?,
                city: row.get(4)?,
                is_verified: row.get(5)?,
                created_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}
