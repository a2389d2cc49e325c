use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::blogs::blog_page;
use super::properties::{property_page, PROPERTIES_KEY};
use super::{decode, list_field, ApiClient};
use crate::error::ApiError;
use crate::models::{Blog, BlogDraft, Paged, Property, Vendor};

/// Response of `GET /admin/check`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminCheck {
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin_emails_configured: bool,
}

#[derive(Deserialize)]
struct BlogEnvelope {
    blog: Blog,
}

/// Create and update answer `{"message": ..., "blog": {...}}`
pub(crate) fn unwrap_blog_envelope(body: Value) -> Result<Blog, ApiError> {
    decode::<BlogEnvelope>(body).map(|envelope| envelope.blog)
}

impl ApiClient {
    /// `GET /admin/check` for the bearer of `token`
    pub async fn check_admin(&self, token: &str) -> Result<AdminCheck, ApiError> {
        let builder = self.request(Method::GET, "/admin/check", Some(token));
        let check: AdminCheck = self.send_as(builder, "check admin status").await?;

        debug!("Admin check response: {:?}", check);
        if !check.is_admin {
            warn!(
                "User is not admin (email: {:?}, admin emails configured: {})",
                check.email, check.admin_emails_configured
            );
        }
        Ok(check)
    }

    async fn admin_action(&self, method: Method, path: String, token: &str, action: &str) -> Result<(), ApiError> {
        let builder = self.request(method, &path, Some(token));
        self.send(builder, action)
            .await
            .inspect_err(|e| error!("Error trying to {}: {}", action, e))?;
        info!("Admin {} succeeded", path);
        Ok(())
    }

    pub async fn admin_vendors(&self, include_inactive: bool, token: &str) -> Result<Vec<Vendor>, ApiError> {
        let builder = self
            .request(Method::GET, "/vendors/admin/all", Some(token))
            .query(&[("include_inactive", include_inactive.to_string())]);
        let mut body = self.send(builder, "fetch vendors").await?;
        let vendors: Vec<Vendor> = list_field(&mut body, "vendors")?;

        debug!("Received {} vendors, include_inactive: {}", vendors.len(), include_inactive);
        Ok(vendors)
    }

    pub async fn admin_delete_vendor(&self, vendor_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(Method::DELETE, format!("/vendors/admin/delete/{vendor_id}"), token, "delete vendor")
            .await
    }

    pub async fn admin_deactivate_vendor(&self, vendor_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(Method::PATCH, format!("/vendors/admin/deactivate/{vendor_id}"), token, "deactivate vendor")
            .await
    }

    pub async fn admin_activate_vendor(&self, vendor_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(Method::PATCH, format!("/vendors/admin/activate/{vendor_id}"), token, "activate vendor")
            .await
    }

    pub async fn admin_properties(
        &self,
        page: u32,
        include_inactive: bool,
        token: &str,
    ) -> Result<Paged<Property>, ApiError> {
        let builder = self
            .request(Method::GET, "/property/admin/all", Some(token))
            .query(&[
                ("page", page.to_string()),
                ("include_inactive", include_inactive.to_string()),
            ]);
        let body = self.send(builder, "fetch properties").await?;
        property_page(body, PROPERTIES_KEY, page)
    }

    pub async fn admin_delete_property(&self, property_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(Method::DELETE, format!("/property/admin/delete/{property_id}"), token, "delete property")
            .await
    }

    pub async fn admin_deactivate_property(&self, property_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(
            Method::PATCH,
            format!("/property/admin/deactivate/{property_id}"),
            token,
            "deactivate property",
        )
        .await
    }

    pub async fn admin_activate_property(&self, property_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(
            Method::PATCH,
            format!("/property/admin/activate/{property_id}"),
            token,
            "activate property",
        )
        .await
    }

    /// All blogs, drafts included when `include_unpublished` is set
    pub async fn admin_blogs(&self, page: u32, include_unpublished: bool, token: &str) -> Result<Paged<Blog>, ApiError> {
        let builder = self
            .request(Method::GET, "/blogs/admin/all", Some(token))
            .query(&[
                ("page", page.to_string()),
                ("include_unpublished", include_unpublished.to_string()),
            ]);
        let body = self.send(builder, "fetch blogs").await?;
        blog_page(body, page)
    }

    pub async fn admin_create_blog(&self, draft: &BlogDraft, token: &str) -> Result<Blog, ApiError> {
        let builder = self
            .request(Method::POST, "/blogs/admin/create", Some(token))
            .json(draft);
        let body = self
            .send(builder, "create blog")
            .await
            .inspect_err(|e| error!("Error creating blog: {}", e))?;
        let blog = unwrap_blog_envelope(body)?;

        info!("Created blog {}", blog.id);
        Ok(blog)
    }

    pub async fn admin_update_blog(&self, blog_id: &str, draft: &BlogDraft, token: &str) -> Result<Blog, ApiError> {
        let builder = self
            .request(Method::PATCH, &format!("/blogs/admin/update/{blog_id}"), Some(token))
            .json(draft);
        let body = self
            .send(builder, "update blog")
            .await
            .inspect_err(|e| error!("Error updating blog: {}", e))?;
        unwrap_blog_envelope(body)
    }

    pub async fn admin_delete_blog(&self, blog_id: &str, token: &str) -> Result<(), ApiError> {
        self.admin_action(Method::DELETE, format!("/blogs/admin/delete/{blog_id}"), token, "delete blog")
            .await
    }
}
