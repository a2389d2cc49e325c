use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{decode, list_field, pages_field, ApiClient, CreatedProperty};
use crate::error::ApiError;
use crate::models::{BackendProperty, NewProperty, Paged, Property, PurchaseRequest};
use crate::normalize::normalize_property;

/// Query parameters of `GET /property/search_properties`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    pub search_term: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub category: Option<String>,
    pub property_type: Option<String>,
    pub page: Option<u32>,
}

impl SearchParams {
    pub fn term(term: impl Into<String>, page: u32) -> Self {
        Self {
            search_term: Some(term.into()),
            page: Some(page),
            ..Default::default()
        }
    }

    /// Query pairs; empty strings and zero numbers are left out like unset values
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let text = [
            ("search_term", &self.search_term),
            ("category", &self.category),
            ("property_type", &self.property_type),
        ];
        for (key, value) in text {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push((key, v.to_string()));
            }
        }
        for (key, value) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(v) = value.filter(|v| *v != 0.0) {
                query.push((key, v.to_string()));
            }
        }
        let counts = [
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
            ("page", self.page),
        ];
        for (key, value) in counts {
            if let Some(v) = value.filter(|v| *v != 0) {
                query.push((key, v.to_string()));
            }
        }
        query
    }
}

/// List key of listing pages (all, mine, admin)
pub(crate) const PROPERTIES_KEY: &str = "properties";
/// List key of search responses
pub(crate) const RESULTS_KEY: &str = "results";

fn normalize_all(raw: Vec<BackendProperty>) -> Vec<Property> {
    raw.into_iter().map(normalize_property).collect()
}

/// Normalized page of listings read from `list_key` of a response body
pub(crate) fn property_page(mut body: Value, list_key: &str, page: u32) -> Result<Paged<Property>, ApiError> {
    let raw: Vec<BackendProperty> = list_field(&mut body, list_key)?;
    Ok(Paged {
        items: normalize_all(raw),
        pages: pages_field(&body),
        current_page: page,
    })
}

/// Detail body of `GET /property/{id}`. The backend answers a missing id with `{"msg": ...}`.
pub(crate) fn property_from_body(id: &str, body: Value) -> Option<Property> {
    if let Some(msg) = body.get("msg") {
        warn!("Property {} not found: {}", id, msg);
        return None;
    }

    match decode::<BackendProperty>(body) {
        Ok(raw) => Some(normalize_property(raw)),
        Err(e) => {
            error!("Error decoding property {}: {}", id, e);
            None
        }
    }
}

impl ApiClient {
    async fn fetch_property_page(
        &self,
        path: &str,
        query: &[(&str, String)],
        list_key: &str,
        page: u32,
        token: Option<&str>,
        action: &str,
    ) -> Result<Paged<Property>, ApiError> {
        let builder = self.request(Method::GET, path, token).query(query);
        let body = self.send(builder, action).await?;
        property_page(body, list_key, page)
    }

    /// `GET /property/all_properties`; empty page on any failure
    pub async fn all_properties(&self, page: u32) -> Paged<Property> {
        let query = [("page", page.to_string())];
        match self
            .fetch_property_page("/property/all_properties", &query, PROPERTIES_KEY, page, None, "fetch properties")
            .await
        {
            Ok(result) => {
                info!("Fetched {} properties, {} pages total", result.items.len(), result.pages);
                result
            }
            Err(e) => {
                error!("Error fetching properties: {}", e);
                Paged::empty(page)
            }
        }
    }

    /// `GET /property/search_properties`; empty page on any failure
    pub async fn search_properties(&self, params: &SearchParams) -> Paged<Property> {
        let page = params.page.unwrap_or(1);
        match self
            .fetch_property_page(
                "/property/search_properties",
                &params.to_query(),
                RESULTS_KEY,
                page,
                None,
                "search properties",
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("Error searching properties: {}", e);
                Paged::empty(page)
            }
        }
    }

    /// `GET /property/recently_added`
    pub async fn recently_added(&self) -> Vec<Property> {
        let builder = self.request(Method::GET, "/property/recently_added", None);
        let result = self
            .send(builder, "fetch recently added properties")
            .await
            .and_then(|body| match body {
                Value::Null => Ok(Vec::new()),
                body => decode::<Vec<BackendProperty>>(body),
            });

        match result {
            Ok(raw) => normalize_all(raw),
            Err(e) => {
                error!("Error fetching recently added properties: {}", e);
                Vec::new()
            }
        }
    }

    /// `GET /property/{id}`; `None` when missing or on failure
    pub async fn property(&self, id: &str) -> Option<Property> {
        let builder = self.request(Method::GET, &format!("/property/{id}"), None);
        let body = match self.send(builder, "fetch property").await {
            Ok(body) => body,
            Err(e) => {
                error!("Error fetching property {}: {}", id, e);
                return None;
            }
        };

        property_from_body(id, body)
    }

    /// `POST /property/new_property/{realtor_id}`
    pub async fn create_property(
        &self,
        realtor_id: &str,
        property: &NewProperty,
        token: &str,
    ) -> Result<CreatedProperty, ApiError> {
        let path = format!("/property/new_property/{realtor_id}");
        debug!(
            bedrooms = property.bedrooms,
            size = %property.size,
            property_type = %property.property_type,
            images = property.property_images.len(),
            "Creating property"
        );

        let builder = self.request(Method::POST, &path, Some(token)).json(property);
        let created: CreatedProperty = self
            .send_as(builder, "create property")
            .await
            .inspect_err(|e| error!("Error creating property: {}", e))?;

        info!("Created property {} with {} images", created.property_id, created.images_saved);
        Ok(created)
    }

    /// `POST /property/purchase/{id}`
    pub async fn purchase_property(
        &self,
        property_id: &str,
        buyer: &PurchaseRequest,
        token: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/property/purchase/{property_id}");
        let builder = self.request(Method::POST, &path, Some(token)).json(buyer);
        self.send(builder, "purchase property")
            .await
            .inspect_err(|e| error!("Error purchasing property: {}", e))?;
        Ok(())
    }

    /// `GET /property/my_properties` for the signed-in seller; empty page on failure
    pub async fn my_properties(&self, token: &str, page: u32, include_inactive: bool) -> Paged<Property> {
        let query = [
            ("page", page.to_string()),
            ("include_inactive", include_inactive.to_string()),
        ];
        match self
            .fetch_property_page(
                "/property/my_properties",
                &query,
                PROPERTIES_KEY,
                page,
                Some(token),
                "fetch properties",
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                error!("Error fetching my properties: {}", e);
                Paged::empty(page)
            }
        }
    }

    async fn owner_action(&self, method: Method, path: String, token: &str, action: &str) -> Result<(), ApiError> {
        let builder = self.request(method, &path, Some(token));
        self.send(builder, action)
            .await
            .inspect_err(|e| error!("Error trying to {}: {}", action, e))?;
        info!("{} succeeded", path);
        Ok(())
    }

    /// Soft-deactivate a listing (`PATCH /property/delist/{id}`)
    pub async fn delist_property(&self, property_id: &str, token: &str) -> Result<(), ApiError> {
        self.owner_action(Method::PATCH, format!("/property/delist/{property_id}"), token, "delist property")
            .await
    }

    /// Reactivate a delisted listing (`PATCH /property/relist/{id}`)
    pub async fn relist_property(&self, property_id: &str, token: &str) -> Result<(), ApiError> {
        self.owner_action(Method::PATCH, format!("/property/relist/{property_id}"), token, "relist property")
            .await
    }

    /// Permanently delete a listing (`DELETE /property/delete/{id}`)
    pub async fn delete_property(&self, property_id: &str, token: &str) -> Result<(), ApiError> {
        self.owner_action(Method::DELETE, format!("/property/delete/{property_id}"), token, "delete property")
            .await
    }
}
