use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};
use url::form_urlencoded;
use uuid::Uuid;

use super::traits::{ImageFile, ImageUploader};

pub const FIREBASE_STORAGE_URL: &str = "https://firebasestorage.googleapis.com/v0/b";

/// Object metadata returned by the storage REST API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredObject {
    name: String,
    #[serde(default)]
    download_tokens: Option<String>,
}

/// Direct upload to the Firebase Storage bucket, one file at a time
pub struct StorageUploader {
    client: Client,
    endpoint: String,
    bucket: Option<String>,
}

impl StorageUploader {
    pub fn new(client: Client, bucket: Option<String>) -> Self {
        Self::with_endpoint(client, FIREBASE_STORAGE_URL, bucket)
    }

    pub fn with_endpoint(client: Client, endpoint: &str, bucket: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
        }
    }

    pub fn is_available(&self) -> bool {
        self.bucket.is_some()
    }

    async fn upload_one(&self, bucket: &str, file: &ImageFile, token: &str) -> Result<String> {
        if !file.is_image() {
            bail!("File must be an image: {}", file.name);
        }

        let path = object_path(&file.name, Utc::now().timestamp_millis(), &random_id());
        debug!("Uploading {} ({} bytes) to {}", file.name, file.bytes.len(), path);

        let response = self
            .client
            .post(format!("{}/{}/o", self.endpoint, bucket))
            .query(&[("name", path.as_str())])
            .header(AUTHORIZATION, format!("Firebase {token}"))
            .header(CONTENT_TYPE, file.content_type.as_str())
            .body(file.bytes.clone())
            .send()
            .await
            .context("Failed to reach storage")?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            bail!("You do not have permission to upload images. Please check storage rules.");
        }
        if !status.is_success() {
            bail!("Failed to upload image: {}", status);
        }

        let stored: StoredObject = response.json().await.context("Failed to read storage response")?;
        Ok(download_url(&self.endpoint, bucket, &stored.name, stored.download_tokens.as_deref()))
    }
}

/// Keep ASCII letters, digits, dots and dashes; everything else becomes `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

pub fn object_path(file_name: &str, millis: i64, random: &str) -> String {
    format!("properties/{}_{}_{}", millis, random, sanitize_file_name(file_name))
}

fn random_id() -> String {
    Uuid::new_v4().simple().to_string()[..13].to_string()
}

pub fn download_url(endpoint: &str, bucket: &str, object: &str, token: Option<&str>) -> String {
    let encoded: String = form_urlencoded::byte_serialize(object.as_bytes()).collect();
    let mut url = format!("{}/{}/o/{}?alt=media", endpoint, bucket, encoded);
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        // several tokens may be listed; any of them works
        let first = token.split(',').next().unwrap_or(token);
        url.push_str("&token=");
        url.push_str(first);
    }
    url
}

#[async_trait]
impl ImageUploader for StorageUploader {
    async fn upload(&self, files: &[ImageFile], token: &str) -> Result<Vec<String>> {
        let Some(bucket) = self.bucket.as_deref() else {
            bail!("Storage is not initialized. Set FLEXSPACE_STORAGE_BUCKET to enable direct uploads.");
        };
        if files.is_empty() {
            return Ok(Vec::new());
        }

        info!("Uploading {} images directly to storage...", files.len());
        let mut urls = Vec::with_capacity(files.len());
        for (i, file) in files.iter().enumerate() {
            let url = self
                .upload_one(bucket, file, token)
                .await
                .inspect_err(|e| error!("Failed to upload image {}: {:#}", i + 1, e))
                .with_context(|| format!("Failed to upload images: {}", file.name))?;
            debug!("Image {}/{} uploaded", i + 1, files.len());
            urls.push(url);
        }

        info!("Uploaded {} images to storage", urls.len());
        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "storage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one request, answer it with `body` and return the request head
    async fn serve_once(listener: TcpListener, body: &'static str) -> String {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request head");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();

        let length = header_value(&head, "content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        head
    }

    fn header_value(head: &str, name: &str) -> Option<String> {
        head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim().to_string())
        })
    }

    #[tokio::test]
    async fn sends_id_token_with_firebase_scheme() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(serve_once(
            listener,
            r#"{"name":"properties/1_x_a.jpg","downloadTokens":"tok"}"#,
        ));

        let uploader = StorageUploader::with_endpoint(Client::new(), &endpoint, Some("b".into()));
        let files = [ImageFile::new("a.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff])];
        let urls = uploader.upload(&files, "ID_TOKEN").await.unwrap();
        let head = server.await.unwrap();

        assert!(head.starts_with("POST /b/o?name=properties%2F"));
        assert_eq!(header_value(&head, "authorization").as_deref(), Some("Firebase ID_TOKEN"));
        assert_eq!(header_value(&head, "content-type").as_deref(), Some("image/jpeg"));
        assert_eq!(urls, vec![format!("{endpoint}/b/o/properties%2F1_x_a.jpg?alt=media&token=tok")]);
    }

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize_file_name("front view (1).jpg"), "front_view__1_.jpg");
        assert_eq!(sanitize_file_name("lot-7.png"), "lot-7.png");
        assert_eq!(sanitize_file_name("façade.png"), "fa_ade.png");
    }

    #[test]
    fn object_path_is_namespaced_and_unique_per_call() {
        assert_eq!(
            object_path("a b.jpg", 1700000000000, "k3j2h1"),
            "properties/1700000000000_k3j2h1_a_b.jpg"
        );
        assert_eq!(random_id().len(), 13);
        assert_ne!(random_id(), random_id());
    }

    #[test]
    fn download_url_encodes_object_name() {
        let url = download_url(
            FIREBASE_STORAGE_URL,
            "demo.appspot.com",
            "properties/1_x_a.jpg",
            Some("tok1,tok2"),
        );
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/properties%2F1_x_a.jpg?alt=media&token=tok1"
        );
    }

    #[tokio::test]
    async fn missing_bucket_is_an_error() {
        let uploader = StorageUploader::new(Client::new(), None);
        assert!(!uploader.is_available());

        let files = [ImageFile::new("a.jpg", "image/jpeg", vec![1, 2, 3])];
        let err = uploader.upload(&files, "token").await.unwrap_err();
        assert!(err.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn non_images_are_rejected_before_any_request() {
        // unroutable endpoint: the check must fail before a request is attempted
        let uploader = StorageUploader::with_endpoint(Client::new(), "http://127.0.0.1:9", Some("bucket".into()));
        let files = [ImageFile::new("notes.txt", "text/plain", b"hi".to_vec())];

        let err = uploader.upload(&files, "token").await.unwrap_err();
        assert!(format!("{:#}", err).contains("File must be an image"));
    }
}
