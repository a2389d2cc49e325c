pub mod backend;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

pub use backend::{BackendProperty, RealtorContact};

/// Whether a listing is offered for sale or for lease
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ListingType {
    #[default]
    Sale,
    Lease,
}

impl ListingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Sale => "Sale",
            ListingType::Lease => "Lease",
        }
    }

    /// Case-insensitive parse of a user-facing filter value ("sale", "Lease", ...)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sale" => Some(ListingType::Sale),
            "lease" => Some(ListingType::Lease),
            _ => None,
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Site category of a property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyKind {
    #[serde(rename = "Traditional Site")]
    TraditionalSite,
    Other,
}

/// Normalized property view-model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub location: String,
    pub price: f64,
    pub acreage: Option<f64>,
    pub unit_count: Option<u32>,
    pub kind: PropertyKind,
    pub listing_type: ListingType,
    pub image: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub owner_id: Option<String>,
    pub realtor: Option<RealtorContact>,
    pub active: bool,
}

/// One page of results from a paginated endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// Total number of pages reported by the backend, 0 when unknown
    pub pages: u32,
    pub current_page: u32,
}

impl<T> Paged<T> {
    pub fn empty(current_page: u32) -> Self {
        Self {
            items: Vec::new(),
            pages: 0,
            current_page,
        }
    }
}

/// The six vendor directory categories. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VendorCategory {
    ConstructionDevelopment,
    PropertyManagement,
    LegalFinancial,
    MarketingAdvertising,
    MaintenanceServices,
    TechnologySolutions,
    Other(String),
}

impl VendorCategory {
    pub const ALL: [VendorCategory; 6] = [
        VendorCategory::ConstructionDevelopment,
        VendorCategory::PropertyManagement,
        VendorCategory::LegalFinancial,
        VendorCategory::MarketingAdvertising,
        VendorCategory::MaintenanceServices,
        VendorCategory::TechnologySolutions,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            VendorCategory::ConstructionDevelopment => "Construction & Development",
            VendorCategory::PropertyManagement => "Property Management",
            VendorCategory::LegalFinancial => "Legal & Financial Services",
            VendorCategory::MarketingAdvertising => "Marketing & Advertising",
            VendorCategory::MaintenanceServices => "Maintenance & Services",
            VendorCategory::TechnologySolutions => "Technology Solutions",
            VendorCategory::Other(name) => name,
        }
    }
}

impl From<&str> for VendorCategory {
    fn from(value: &str) -> Self {
        VendorCategory::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
            .cloned()
            .unwrap_or_else(|| VendorCategory::Other(value.to_string()))
    }
}

impl fmt::Display for VendorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VendorCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VendorCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(VendorCategory::from(raw.as_str()))
    }
}

/// Service provider listed in the vendor directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vendor_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub category: VendorCategory,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
    pub location: Option<String>,
    pub logo_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Naive UTC timestamp as serialized by the backend
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date_created: Option<NaiveDateTime>,
}

/// Payload for `POST /vendors/register`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VendorRegistration {
    pub company_name: String,
    pub description: String,
    pub category: String,
    pub services: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Industry insights article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// HTML body
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    pub author_email: Option<String>,
    pub featured_image_url: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date_created: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub date_published: Option<NaiveDateTime>,
}

/// Create/update payload for admin blog endpoints. Absent fields are left untouched on update.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlogDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// Split the comma-separated tag field of the admin blog form
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Marketplace role chosen at sign-up
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Buyer,
    Seller,
}

/// Locally cached profile of the signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Payload for `POST /property/new_property/{realtor_id}`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewProperty {
    pub address: String,
    pub location: String,
    pub description: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub category: String,
    pub price: f64,
    pub property_type: String,
    pub size: String,
    pub property_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    /// Phone number; the backend calls this field `contact`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Buyer contact details for `POST /property/purchase/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend timestamp, or `None` when absent or unparseable.
/// Accepts Python isoformat, RFC 3339 and the RFC 2822 form Flask's JSON encoder emits.
pub(crate) fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(raw)) => raw,
        Some(other) => {
            warn!("Ignoring non-string timestamp: {}", other);
            return Ok(None);
        }
        None => return Ok(None),
    };

    let parsed = raw
        .parse::<NaiveDateTime>()
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(&raw).ok().map(|dt| dt.naive_utc()))
        .or_else(|| DateTime::parse_from_rfc2822(&raw).ok().map(|dt| dt.naive_utc()));
    if parsed.is_none() {
        warn!("Could not parse timestamp: {}", raw);
    }
    Ok(parsed)
}
