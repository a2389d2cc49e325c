use async_trait::async_trait;

use crate::api::{ApiClient, SearchParams};
use crate::error::ApiError;
use crate::models::{Blog, Paged, Property, Vendor};

/// Where public listing pages get their properties from
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Every active listing, one page at a time
    async fn list_all(&self, page: u32) -> Paged<Property>;

    /// Listings matching a free-text search
    async fn search(&self, params: &SearchParams) -> Paged<Property>;
}

/// Backing data for the admin dashboard tabs
#[async_trait]
pub trait AdminSource: Send + Sync {
    async fn load_vendors(&self, include_inactive: bool, token: &str) -> Result<Vec<Vendor>, ApiError>;

    async fn load_properties(&self, page: u32, include_inactive: bool, token: &str) -> Result<Paged<Property>, ApiError>;

    async fn load_blogs(&self, page: u32, include_unpublished: bool, token: &str) -> Result<Paged<Blog>, ApiError>;
}

#[async_trait]
impl ListingSource for ApiClient {
    async fn list_all(&self, page: u32) -> Paged<Property> {
        self.all_properties(page).await
    }

    async fn search(&self, params: &SearchParams) -> Paged<Property> {
        self.search_properties(params).await
    }
}

#[async_trait]
impl AdminSource for ApiClient {
    async fn load_vendors(&self, include_inactive: bool, token: &str) -> Result<Vec<Vendor>, ApiError> {
        self.admin_vendors(include_inactive, token).await
    }

    async fn load_properties(&self, page: u32, include_inactive: bool, token: &str) -> Result<Paged<Property>, ApiError> {
        self.admin_properties(page, include_inactive, token).await
    }

    async fn load_blogs(&self, page: u32, include_unpublished: bool, token: &str) -> Result<Paged<Blog>, ApiError> {
        self.admin_blogs(page, include_unpublished, token).await
    }
}
