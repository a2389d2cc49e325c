use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::{ApiClient, CreatedProperty};
use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::models::{ListingType, NewProperty, PropertyKind};
use crate::upload::{ImageFile, UploadCoordinator, UploadOutcome};

/// Backend routes on this placeholder; the owner is resolved from the token
const REALTOR_PLACEHOLDER: &str = "temp-realtor-id";

/// What a seller fills in on the submission form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub location: String,
    pub description: String,
    pub price: f64,
    pub acreage: Option<f64>,
    pub unit_count: Option<u32>,
    pub kind: PropertyKind,
    pub listing_type: ListingType,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl ListingForm {
    /// Backend payload for this form with the uploaded image URLs attached
    pub fn into_new_property(self, images: Vec<String>) -> NewProperty {
        NewProperty {
            address: self.title,
            location: self.location,
            description: self.description,
            bedrooms: self.unit_count.unwrap_or(0),
            bathrooms: 1,
            category: match self.kind {
                PropertyKind::TraditionalSite => "Traditional Site".to_string(),
                PropertyKind::Other => "Other".to_string(),
            },
            price: self.price,
            property_type: match self.listing_type {
                ListingType::Sale => "Commercial".to_string(),
                ListingType::Lease => "Lease".to_string(),
            },
            size: self.acreage.map(|a| format!("{a} acres")).unwrap_or_default(),
            property_images: images,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            contact: self.contact_phone,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmitReport {
    pub created: CreatedProperty,
    pub upload: UploadOutcome,
}

/// Upload the images (never fatal) and create the listing for the signed-in seller
pub async fn submit_property(
    api: &ApiClient,
    uploads: &UploadCoordinator,
    auth: &AuthContext,
    form: ListingForm,
    images: &[ImageFile],
    skip_images: bool,
) -> Result<SubmitReport, ApiError> {
    if !auth.is_seller() {
        return Err(ApiError::NotSeller);
    }
    let token = auth.id_token().ok_or(ApiError::NotLoggedIn)?;

    let upload = uploads.upload_unless_skipped(images, token, skip_images).await;
    if let Some(banner) = upload.banner() {
        info!("Upload status: {}", banner);
    }

    let property = form.into_new_property(upload.urls.clone());
    let created = api.create_property(REALTOR_PLACEHOLDER, &property, token).await?;

    if upload.urls.is_empty() {
        warn!("Property {} created without images", created.property_id);
    } else {
        info!("Property {} created with {} images", created.property_id, upload.urls.len());
    }
    Ok(SubmitReport { created, upload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ProfileStore;
    use crate::config::Config;
    use crate::normalize::parse_acreage;

    fn form() -> ListingForm {
        ListingForm {
            title: "Blue Water Storage".to_string(),
            location: "Paris, TX".to_string(),
            description: "335 units".to_string(),
            price: 2_300_000.0,
            acreage: Some(5.07),
            unit_count: Some(335),
            kind: PropertyKind::TraditionalSite,
            listing_type: ListingType::Lease,
            contact_name: Some("Pat".to_string()),
            contact_email: None,
            contact_phone: Some("555-0100".to_string()),
        }
    }

    #[test]
    fn form_maps_to_backend_fields() {
        let property = form().into_new_property(vec!["https://cdn/a.jpg".to_string()]);

        assert_eq!(property.address, "Blue Water Storage");
        assert_eq!(property.bedrooms, 335);
        assert_eq!(property.category, "Traditional Site");
        assert_eq!(property.property_type, "Lease");
        assert_eq!(property.size, "5.07 acres");
        assert_eq!(property.contact.as_deref(), Some("555-0100"));

        let json = serde_json::to_value(&property).unwrap();
        assert!(json.get("contact_email").is_none());
    }

    #[test]
    fn size_round_trips_through_acreage_parser() {
        let property = form().into_new_property(Vec::new());
        assert_eq!(parse_acreage(Some(&property.size)), Some(5.07));

        let no_acreage = ListingForm {
            acreage: None,
            listing_type: ListingType::Sale,
            ..form()
        }
        .into_new_property(Vec::new());
        assert_eq!(no_acreage.size, "");
        assert_eq!(no_acreage.property_type, "Commercial");
    }

    #[tokio::test]
    async fn buyers_cannot_submit() {
        let config = Config::default();
        let api = ApiClient::new(&config).unwrap();
        let uploads = UploadCoordinator::from_config(&api, &config);
        let auth = AuthContext::new(ProfileStore::new("unused-profile.json"));

        let err = submit_property(&api, &uploads, &auth, form(), &[], true)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotSeller));
    }
}
