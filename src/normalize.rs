use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::models::{BackendProperty, ListingType, Property, PropertyKind};

/// Stock photo shown for listings without uploaded images
pub const DEFAULT_PROPERTY_IMAGE: &str =
    "https://images.unsplash.com/photo-1560518883-ce09059eeffa?q=80&w=1973&auto=format&fit=crop";

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+\.?\d*)").expect("Invalid number regex"));

/// Extract the first numeric token from a free-text size ("7.93 acres" -> 7.93)
pub fn parse_acreage(size: Option<&str>) -> Option<f64> {
    let size = match size.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => {
            debug!("No size field provided");
            return None;
        }
    };

    let parsed = NUMBER_RE
        .captures(size)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    match parsed {
        Some(acreage) => debug!("Parsed acreage from size: {} -> {}", size, acreage),
        None => warn!("Could not parse acreage from size: {}", size),
    }

    parsed
}

/// Map the backend `property_type` onto a listing type. Unknown values are Sale.
pub fn listing_type_from(property_type: Option<&str>) -> ListingType {
    match property_type.map(|t| t.trim().to_lowercase()) {
        Some(t) if t == "lease" => ListingType::Lease,
        _ => ListingType::Sale,
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Convert a backend record into the view-model used by listing pages
pub fn normalize_property(raw: BackendProperty) -> Property {
    debug!(
        id = %raw.id,
        address = %raw.address,
        bedrooms = raw.bedrooms,
        size = ?raw.size,
        property_type = ?raw.property_type,
        "Normalizing backend property"
    );

    let image = raw
        .property_images
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_PROPERTY_IMAGE.to_string());

    let title = non_blank(&raw.address)
        .or_else(|| non_blank(&raw.location))
        .unwrap_or("Property")
        .to_string();

    let kind = if raw.category == "Traditional Site" {
        PropertyKind::TraditionalSite
    } else {
        PropertyKind::Other
    };

    let unit_count = u32::try_from(raw.bedrooms).ok().filter(|n| *n > 0);

    Property {
        acreage: parse_acreage(raw.size.as_deref()),
        listing_type: listing_type_from(raw.property_type.as_deref()),
        unit_count,
        kind,
        image,
        title,
        id: raw.id,
        location: raw.location,
        price: raw.price,
        description: raw.description,
        images: raw.property_images,
        owner_id: raw.owner_id,
        realtor: raw.realtor,
        active: raw.active.unwrap_or(true),
    }
}
