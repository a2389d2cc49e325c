pub mod backend;
pub mod storage;
pub mod traits;

use std::time::Duration;
use tracing::{info, warn};

pub use backend::BackendUploader;
pub use storage::StorageUploader;
pub use traits::{ImageFile, ImageUploader};

use crate::api::ApiClient;
use crate::config::Config;

pub const UPLOAD_FAILED_MESSAGE: &str = "Upload timed out or failed. Please try again.";

/// What the status banner should say after an upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// Nothing to upload, or the user chose to skip images
    Skipped,
    Uploaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub urls: Vec<String>,
    pub status: UploadStatus,
}

impl UploadOutcome {
    fn skipped() -> Self {
        Self {
            urls: Vec::new(),
            status: UploadStatus::Skipped,
        }
    }

    /// Banner text for the submission form, if any
    pub fn banner(&self) -> Option<String> {
        match &self.status {
            UploadStatus::Skipped => None,
            UploadStatus::Uploaded => Some(format!("Uploaded {} images", self.urls.len())),
            UploadStatus::Failed(message) => Some(message.clone()),
        }
    }
}

/// Backend upload first, direct storage upload on failure, all under one deadline.
///
/// Never fails: a timeout or a double failure yields no URLs and a
/// [`UploadStatus::Failed`] so the listing can still be saved without images.
pub struct UploadCoordinator {
    primary: Box<dyn ImageUploader>,
    fallback: Option<Box<dyn ImageUploader>>,
    timeout: Duration,
}

impl UploadCoordinator {
    pub fn new(
        primary: Box<dyn ImageUploader>,
        fallback: Option<Box<dyn ImageUploader>>,
        timeout: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            timeout,
        }
    }

    pub fn from_config(api: &ApiClient, config: &Config) -> Self {
        let storage = StorageUploader::new(api.http().clone(), config.storage_bucket.clone());
        Self::new(
            Box::new(BackendUploader::new(api.clone())),
            Some(Box::new(storage)),
            config.upload_timeout,
        )
    }

    async fn attempt(&self, files: &[ImageFile], token: &str) -> Vec<String> {
        let err = match self.primary.upload(files, token).await {
            Ok(urls) => return urls,
            Err(e) => e,
        };
        warn!("{} upload failed: {:#}", self.primary.name(), err);

        let Some(fallback) = &self.fallback else {
            return Vec::new();
        };
        info!("Falling back to {} upload...", fallback.name());
        fallback.upload(files, token).await.unwrap_or_else(|e| {
            warn!("{} upload failed: {:#}", fallback.name(), e);
            Vec::new()
        })
    }

    pub async fn upload(&self, files: &[ImageFile], token: &str) -> UploadOutcome {
        if files.is_empty() {
            return UploadOutcome::skipped();
        }
        info!("Starting upload of {} images...", files.len());

        let urls = tokio::time::timeout(self.timeout, self.attempt(files, token))
            .await
            .unwrap_or_else(|_| {
                warn!("Upload timed out after {:?}", self.timeout);
                Vec::new()
            });

        if urls.is_empty() {
            warn!("No images uploaded, continuing without images");
            UploadOutcome {
                urls,
                status: UploadStatus::Failed(UPLOAD_FAILED_MESSAGE.to_string()),
            }
        } else {
            info!("Upload completed with {} URLs", urls.len());
            UploadOutcome {
                urls,
                status: UploadStatus::Uploaded,
            }
        }
    }

    /// Same as [`upload`](Self::upload), unless the user asked to skip images
    pub async fn upload_unless_skipped(&self, files: &[ImageFile], token: &str, skip: bool) -> UploadOutcome {
        if skip {
            info!("Skipping image upload as requested");
            return UploadOutcome::skipped();
        }
        self.upload(files, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behavior {
        Succeed(&'static str),
        Fail,
        Hang,
    }

    struct FakeUploader {
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl FakeUploader {
        fn boxed(behavior: Behavior) -> (Box<dyn ImageUploader>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let uploader = FakeUploader {
                behavior,
                calls: calls.clone(),
            };
            (Box::new(uploader), calls)
        }
    }

    #[async_trait]
    impl ImageUploader for FakeUploader {
        async fn upload(&self, files: &[ImageFile], _token: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed(host) => Ok(files.iter().map(|f| format!("https://{host}/{}", f.name)).collect()),
                Behavior::Fail => bail!("connection reset"),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(vec!["https://late/never.jpg".to_string()])
                }
            }
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn files() -> Vec<ImageFile> {
        vec![
            ImageFile::new("front.jpg", "image/jpeg", vec![0xff, 0xd8]),
            ImageFile::new("lot.png", "image/png", vec![0x89, 0x50]),
        ]
    }

    const TIMEOUT: Duration = Duration::from_secs(15);

    #[tokio::test]
    async fn backend_success_skips_fallback() {
        let (primary, _) = FakeUploader::boxed(Behavior::Succeed("backend"));
        let (fallback, fallback_calls) = FakeUploader::boxed(Behavior::Succeed("storage"));
        let coordinator = UploadCoordinator::new(primary, Some(fallback), TIMEOUT);

        let outcome = coordinator.upload(&files(), "token").await;

        assert_eq!(outcome.status, UploadStatus::Uploaded);
        assert_eq!(outcome.urls, vec!["https://backend/front.jpg", "https://backend/lot.png"]);
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_storage() {
        let (primary, _) = FakeUploader::boxed(Behavior::Fail);
        let (fallback, fallback_calls) = FakeUploader::boxed(Behavior::Succeed("storage"));
        let coordinator = UploadCoordinator::new(primary, Some(fallback), TIMEOUT);

        let outcome = coordinator.upload(&files(), "token").await;

        assert_eq!(outcome.urls[0], "https://storage/front.jpg");
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn double_failure_returns_empty_list() {
        let (primary, _) = FakeUploader::boxed(Behavior::Fail);
        let (fallback, _) = FakeUploader::boxed(Behavior::Fail);
        let coordinator = UploadCoordinator::new(primary, Some(fallback), TIMEOUT);

        let outcome = coordinator.upload(&files(), "token").await;

        assert!(outcome.urls.is_empty());
        assert_eq!(outcome.status, UploadStatus::Failed(UPLOAD_FAILED_MESSAGE.to_string()));
        assert_eq!(outcome.banner().as_deref(), Some(UPLOAD_FAILED_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_returns_empty_list() {
        let (primary, _) = FakeUploader::boxed(Behavior::Hang);
        let coordinator = UploadCoordinator::new(primary, None, TIMEOUT);

        let started = tokio::time::Instant::now();
        let outcome = coordinator.upload(&files(), "token").await;

        assert!(outcome.urls.is_empty());
        assert!(matches!(outcome.status, UploadStatus::Failed(_)));
        let waited = started.elapsed();
        assert!(waited >= TIMEOUT && waited < TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_fallback_is_cut_off_by_the_same_deadline() {
        let (primary, _) = FakeUploader::boxed(Behavior::Fail);
        let (fallback, fallback_calls) = FakeUploader::boxed(Behavior::Hang);
        let coordinator = UploadCoordinator::new(primary, Some(fallback), TIMEOUT);

        let outcome = coordinator.upload(&files(), "token").await;

        assert!(outcome.urls.is_empty());
        assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_files_or_skip_means_no_banner() {
        let (primary, calls) = FakeUploader::boxed(Behavior::Succeed("backend"));
        let coordinator = UploadCoordinator::new(primary, None, TIMEOUT);

        let outcome = coordinator.upload(&[], "token").await;
        assert_eq!(outcome.status, UploadStatus::Skipped);
        assert_eq!(outcome.banner(), None);

        let outcome = coordinator.upload_unless_skipped(&files(), "token", true).await;
        assert_eq!(outcome.status, UploadStatus::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
