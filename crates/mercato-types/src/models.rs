use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation state of a listing.
///
/// Transitions are guarded: a listing moves `draft -> submitted` when the
/// vendor submits it for review, `submitted -> active | rejected` when an
/// admin moderates it, and `rejected -> submitted` when the vendor
/// resubmits after edits. Everything else is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Submitted,
    Active,
    Rejected,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Submitted => "submitted",
            ListingStatus::Active => "active",
            ListingStatus::Rejected => "rejected",
        }
    }

    /// Whether the vendor who owns the listing may move it from `self` to `to`.
    pub fn vendor_can_transition(&self, to: ListingStatus) -> bool {
        matches!(
            (self, to),
            (ListingStatus::Draft, ListingStatus::Submitted)
                | (ListingStatus::Rejected, ListingStatus::Submitted)
        )
    }

    /// Whether an admin may move a listing from `self` to `to`.
    /// Admins only moderate submitted listings.
    pub fn admin_can_transition(&self, to: ListingStatus) -> bool {
        matches!(
            (self, to),
            (ListingStatus::Submitted, ListingStatus::Active)
                | (ListingStatus::Submitted, ListingStatus::Rejected)
        )
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ListingStatus::Draft),
            "submitted" => Ok(ListingStatus::Submitted),
            "active" => Ok(ListingStatus::Active),
            "rejected" => Ok(ListingStatus::Rejected),
            other => Err(format!("unknown listing status '{other}'")),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
