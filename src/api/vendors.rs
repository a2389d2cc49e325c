use reqwest::Method;
use tracing::{error, info, warn};

use super::{list_field, ApiClient, RegisteredVendor};
use crate::error::ApiError;
use crate::models::{Vendor, VendorCategory, VendorRegistration};

impl ApiClient {
    async fn fetch_vendors(&self, path: &str, query: &[(&str, String)], token: Option<&str>) -> Result<Vec<Vendor>, ApiError> {
        let builder = self.request(Method::GET, path, token).query(query);
        let mut body = self.send(builder, "fetch vendors").await?;
        list_field(&mut body, "vendors")
    }

    /// `GET /vendors`, optionally narrowed to a category or to verified vendors
    pub async fn vendors(&self, category: Option<&VendorCategory>, verified_only: bool) -> Vec<Vendor> {
        let mut query = Vec::new();
        if let Some(category) = category {
            query.push(("category", category.to_string()));
        }
        if verified_only {
            query.push(("verified_only", "true".to_string()));
        }

        match self.fetch_vendors("/vendors", &query, None).await {
            Ok(vendors) => vendors,
            Err(e @ ApiError::Unreachable { .. }) => {
                warn!("Backend server may not be running: {}", e);
                Vec::new()
            }
            Err(e) => {
                error!("Error fetching vendors: {}", e);
                Vec::new()
            }
        }
    }

    /// `GET /vendors/category/{category}` (active vendors only)
    pub async fn vendors_by_category(&self, category: &VendorCategory) -> Vec<Vendor> {
        let encoded = url::form_urlencoded::byte_serialize(category.as_str().as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        let path = format!("/vendors/category/{encoded}");

        self.fetch_vendors(&path, &[], None).await.unwrap_or_else(|e| {
            error!("Error fetching vendors by category: {}", e);
            Vec::new()
        })
    }

    /// `POST /vendors/register` for the signed-in user
    pub async fn register_vendor(
        &self,
        registration: &VendorRegistration,
        token: &str,
    ) -> Result<RegisteredVendor, ApiError> {
        let builder = self
            .request(Method::POST, "/vendors/register", Some(token))
            .json(registration);
        let registered: RegisteredVendor = self
            .send_as(builder, "register vendor")
            .await
            .inspect_err(|e| error!("Error registering vendor: {}", e))?;

        info!("Registered vendor {}", registered.vendor_id);
        Ok(registered)
    }
}
