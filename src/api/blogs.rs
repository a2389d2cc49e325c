use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::{decode, list_field, pages_field, ApiClient};
use crate::error::ApiError;
use crate::models::{Blog, Paged};

/// Category value the insights page uses for "no filter"
pub const ALL_CATEGORIES: &str = "All";

pub(crate) fn blog_page(mut body: Value, page: u32) -> Result<Paged<Blog>, ApiError> {
    let items = list_field(&mut body, "blogs")?;
    let current_page = body
        .get("current_page")
        .and_then(Value::as_u64)
        .and_then(|p| u32::try_from(p).ok())
        .filter(|p| *p > 0)
        .unwrap_or(page);

    Ok(Paged {
        items,
        pages: pages_field(&body),
        current_page,
    })
}

/// A 404 is an ordinary "no such article"; other failures are logged
pub(crate) fn blog_from_response(blog_id: &str, response: Result<Value, ApiError>) -> Option<Blog> {
    match response {
        Ok(body) => decode(body)
            .inspect_err(|e| error!("Error decoding blog {}: {}", blog_id, e))
            .ok(),
        Err(e) if e.status() == Some(StatusCode::NOT_FOUND) => {
            debug!("Blog {} not found", blog_id);
            None
        }
        Err(e) => {
            error!("Error fetching blog: {}", e);
            None
        }
    }
}

impl ApiClient {
    /// `GET /blogs`: published posts, optionally filtered by category
    pub async fn blogs(&self, category: Option<&str>, page: u32) -> Paged<Blog> {
        let mut query = vec![("page", page.to_string())];
        if let Some(category) = category.filter(|c| !c.is_empty() && *c != ALL_CATEGORIES) {
            query.push(("category", category.to_string()));
        }

        let builder = self.request(Method::GET, "/blogs", None).query(&query);
        let result = match self.send(builder, "fetch blogs").await {
            Ok(body) => blog_page(body, page),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            if matches!(e, ApiError::Unreachable { .. }) {
                warn!("Backend server may not be running");
            }
            error!("Error fetching blogs: {}", e);
            Paged::empty(page)
        })
    }

    /// `GET /blogs/{id}`; `None` on 404 or failure
    pub async fn blog(&self, blog_id: &str) -> Option<Blog> {
        let builder = self.request(Method::GET, &format!("/blogs/{blog_id}"), None);
        blog_from_response(blog_id, self.send(builder, "fetch blog").await)
    }
}
