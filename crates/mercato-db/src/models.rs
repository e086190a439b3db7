//! Database row types, mapped directly from SQLite rows.
//! Distinct from the mercato-types API models.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
}

pub struct VendorRow {
    pub id: String,
    pub user_id: String,
    pub business_name: String,
    pub vat_number: Option<String>,
    pub city: Option<String>,
    pub is_verified: bool,
    pub created_at: String,
}

/// Minimal projection used for ownership and transition checks before a write.
pub struct ListingOwnerRow {
    pub id: String,
    pub vendor_id: String,
    pub vendor_user_id: String,
    pub status: String,
}

pub struct PublicListingRow {
    pub listing_id: String,
    pub vendor_id: String,
    pub business_name: String,
    pub is_verified: bool,
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
    /// Category names joined with char(31) by the view's group_concat, None
    /// when the listing has no categories.
    pub categories: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct VendorListingRow {
    pub listing_id: String,
    pub vendor_id: String,
    pub vendor_user_id: String,
    pub business_name: String,
    pub title: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub listing_id: Option<String>,
    pub subject: Option<String>,
    pub content: String,
    pub read: bool,
    pub created_at: String,
    pub sender_name: Option<String>,
    pub sender_email: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub listing_title: Option<String>,
}

pub struct FavoriteListingRow {
    pub user_id: String,
    pub listing_id: String,
    pub favorited_at: String,
    pub title: String,
    pub city: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    pub business_name: String,
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
}

// -- Insert / update parameter structs --

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

pub struct NewVendor<'a> {
    pub id: &'a str,
    pub business_name: &'a str,
    pub vat_number: Option<&'a str>,
    pub city: Option<&'a str>,
}

pub struct NewListing<'a> {
    pub id: &'a str,
    pub vendor_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub city: Option<&'a str>,
    pub contact_email: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
    pub opening_hours: Option<&'a str>,
}

/// Whitelisted listing fields for a partial update. `None` leaves the column
/// untouched. Status strings are validated by the caller before they get here.
#[derive(Default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub opening_hours: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
    /// `Some` replaces the full category set, `None` leaves links untouched.
    pub category_ids: Option<Vec<String>>,
}

impl ListingUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.city.is_none()
            && self.contact_email.is_none()
            && self.contact_phone.is_none()
            && self.opening_hours.is_none()
            && self.image_url.is_none()
            && self.status.is_none()
            && self.category_ids.is_none()
    }
}
