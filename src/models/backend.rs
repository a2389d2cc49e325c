use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Contact block attached to a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RealtorContact {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub realtor_id: Option<String>,
}

/// Property record exactly as the backend serializes it.
///
/// Every field is optional on the wire: older records miss `size`, seeded
/// rows carry `null` images, and so on. Missing values fall back to their
/// defaults so that normalization never fails.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackendProperty {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub owner_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    /// Reused by the marketplace as the unit count
    #[serde(deserialize_with = "null_as_default")]
    pub bedrooms: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bathrooms: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub price: f64,
    /// "Commercial"/"Sale" or "Lease"
    pub property_type: Option<String>,
    pub active: Option<bool>,
    pub date_created: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub property_images: Vec<String>,
    /// Free text such as "7.93 acres"
    pub size: Option<String>,
    pub realtor: Option<RealtorContact>,
}
