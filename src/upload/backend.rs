use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info};

use super::traits::{ImageFile, ImageUploader};
use crate::api::ApiClient;

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(default)]
    image_urls: Vec<String>,
}

/// Multipart upload through `POST /utils/upload_images`; the backend stores the files
pub struct BackendUploader {
    api: ApiClient,
}

impl BackendUploader {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

fn form_for(files: &[ImageFile]) -> Result<Form> {
    files.iter().enumerate().try_fold(Form::new(), |form, (i, file)| {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .with_context(|| format!("Invalid content type for {}", file.name))?;
        Ok(form.part(format!("image_{i}"), part))
    })
}

#[async_trait]
impl ImageUploader for BackendUploader {
    async fn upload(&self, files: &[ImageFile], token: &str) -> Result<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        info!("Uploading {} images to backend...", files.len());

        let builder = self
            .api
            .request(Method::POST, "/utils/upload_images", Some(token))
            .multipart(form_for(files)?);
        let body = self
            .api
            .send(builder, "upload images")
            .await
            .map_err(|e| anyhow!("Failed to upload images: {}", e))?;

        let response: UploadResponse =
            serde_json::from_value(body).context("Failed to read upload response")?;
        debug!("Backend returned image URLs: {:?}", response.image_urls);
        info!("Backend upload succeeded with {} URLs", response.image_urls.len());

        Ok(response.image_urls)
    }

    fn name(&self) -> &'static str {
        "backend"
    }
}
