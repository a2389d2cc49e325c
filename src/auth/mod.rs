//! Current user, cached role and admin flag.
//!
//! Sign-in itself happens with the identity provider; this context is told
//! about auth state changes and keeps the marketplace profile in sync.

pub mod store;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{UserProfile, UserRole};

pub use store::ProfileStore;

/// Identity of a user signed in with the auth provider
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Bearer token for backend calls
    pub id_token: String,
}

/// Answers whether the bearer of a token is an administrator
#[async_trait]
pub trait AdminStatusSource: Send + Sync {
    async fn is_admin(&self, token: &str) -> Result<bool, ApiError>;
}

#[async_trait]
impl AdminStatusSource for ApiClient {
    async fn is_admin(&self, token: &str) -> Result<bool, ApiError> {
        Ok(self.check_admin(token).await?.is_admin)
    }
}

/// Profile to use for `user`, given what is cached. `true` means it must be written back.
pub fn resolve_profile(cached: Option<UserProfile>, user: &AuthUser) -> (UserProfile, bool) {
    match cached {
        Some(profile) if profile.uid == user.uid => (profile, false),
        Some(previous) => (
            UserProfile {
                uid: user.uid.clone(),
                email: user.email.clone(),
                display_name: user.display_name.clone().or(previous.display_name),
                role: previous.role,
            },
            true,
        ),
        None => (
            UserProfile {
                uid: user.uid.clone(),
                email: user.email.clone(),
                display_name: user.display_name.clone(),
                role: UserRole::Buyer,
            },
            true,
        ),
    }
}

pub struct AuthContext {
    store: ProfileStore,
    user: Option<AuthUser>,
    profile: Option<UserProfile>,
    is_admin: bool,
}

impl AuthContext {
    pub fn new(store: ProfileStore) -> Self {
        Self {
            store,
            user: None,
            profile: None,
            is_admin: false,
        }
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_seller(&self) -> bool {
        self.user.is_some() && self.profile.as_ref().is_some_and(|p| p.role == UserRole::Seller)
    }

    pub fn id_token(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id_token.as_str())
    }

    async fn cached_profile(&self) -> Option<UserProfile> {
        self.store.load().await.unwrap_or_else(|e| {
            error!("Error parsing saved profile: {:#}", e);
            None
        })
    }

    /// Load whatever profile is cached, before the auth provider reports a user
    pub async fn restore(&mut self) {
        self.profile = self.cached_profile().await;
    }

    /// Apply an auth state change and refresh the admin flag
    pub async fn on_auth_state_changed(
        &mut self,
        user: Option<AuthUser>,
        admin: &dyn AdminStatusSource,
    ) -> Result<()> {
        match user {
            Some(user) => {
                let (profile, changed) = resolve_profile(self.cached_profile().await, &user);
                if changed {
                    self.store.save(&profile).await?;
                }
                info!("Signed in as {} ({:?})", profile.uid, profile.role);
                self.profile = Some(profile);
                self.user = Some(user);
            }
            None => {
                self.user = None;
                self.profile = None;
                self.store.clear().await?;
            }
        }

        self.refresh_admin_status(admin).await;
        Ok(())
    }

    /// Record the role chosen at registration
    pub async fn sign_up(&mut self, user: AuthUser, role: UserRole, display_name: Option<String>) -> Result<()> {
        let profile = UserProfile {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: display_name.or_else(|| user.display_name.clone()),
            role,
        };
        self.store.save(&profile).await?;
        self.profile = Some(profile);
        self.user = Some(user);
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<()> {
        self.user = None;
        self.profile = None;
        self.is_admin = false;
        self.store.clear().await
    }

    pub async fn update_role(&mut self, role: UserRole) -> Result<()> {
        let profile = self.profile.as_mut().ok_or(ApiError::NotLoggedIn)?;
        profile.role = role;
        self.store.save(profile).await
    }

    /// Ask the backend whether the current user is an admin. Any failure means no.
    pub async fn refresh_admin_status(&mut self, admin: &dyn AdminStatusSource) -> bool {
        self.is_admin = match &self.user {
            None => false,
            Some(user) => admin.is_admin(&user.id_token).await.unwrap_or_else(|e| {
                warn!("Failed to check admin status: {}", e);
                false
            }),
        };
        self.is_admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use tempfile::TempDir;

    struct Admins(&'static [&'static str]);

    #[async_trait]
    impl AdminStatusSource for Admins {
        async fn is_admin(&self, token: &str) -> Result<bool, ApiError> {
            if token == "broken" {
                return Err(ApiError::Rejected {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "boom".to_string(),
                });
            }
            Ok(self.0.iter().any(|admin| *admin == token))
        }
    }

    fn user(uid: &str, token: &str) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            email: Some(format!("{uid}@example.com")),
            display_name: None,
            id_token: token.to_string(),
        }
    }

    fn context(dir: &TempDir) -> AuthContext {
        AuthContext::new(ProfileStore::new(dir.path().join("profile.json")))
    }

    #[tokio::test]
    async fn new_user_gets_cached_buyer_profile() {
        let dir = TempDir::new().unwrap();
        let mut auth = context(&dir);

        auth.on_auth_state_changed(Some(user("u1", "t1")), &Admins(&[]))
            .await
            .unwrap();

        assert_eq!(auth.profile().unwrap().role, UserRole::Buyer);
        assert!(!auth.is_seller());
        let cached = ProfileStore::new(dir.path().join("profile.json")).load().await.unwrap();
        assert_eq!(cached.unwrap().uid, "u1");
    }

    #[tokio::test]
    async fn matching_cached_profile_keeps_role() {
        let dir = TempDir::new().unwrap();
        let mut auth = context(&dir);
        auth.sign_up(user("u1", "t1"), UserRole::Seller, Some("Sam".to_string()))
            .await
            .unwrap();

        let mut fresh = context(&dir);
        fresh.restore().await;
        assert_eq!(fresh.profile().unwrap().display_name.as_deref(), Some("Sam"));

        fresh
            .on_auth_state_changed(Some(user("u1", "t1")), &Admins(&[]))
            .await
            .unwrap();
        assert!(fresh.is_seller());
    }

    #[tokio::test]
    async fn corrupt_cache_yields_fresh_profile() {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("profile.json"), "{not json").await.unwrap();
        let mut auth = context(&dir);

        auth.on_auth_state_changed(Some(user("u2", "t2")), &Admins(&[]))
            .await
            .unwrap();
        assert_eq!(auth.profile().unwrap().uid, "u2");
        assert_eq!(auth.profile().unwrap().role, UserRole::Buyer);
    }

    #[tokio::test]
    async fn sign_out_clears_cache_and_admin_flag() {
        let dir = TempDir::new().unwrap();
        let mut auth = context(&dir);
        auth.on_auth_state_changed(Some(user("u1", "admin-token")), &Admins(&["admin-token"]))
            .await
            .unwrap();
        assert!(auth.is_admin());

        auth.sign_out().await.unwrap();
        assert!(!auth.is_admin());
        assert!(auth.profile().is_none());
        assert!(!dir.path().join("profile.json").exists());
    }

    #[tokio::test]
    async fn admin_check_failure_means_not_admin() {
        let dir = TempDir::new().unwrap();
        let mut auth = context(&dir);
        auth.on_auth_state_changed(Some(user("u1", "broken")), &Admins(&["broken"]))
            .await
            .unwrap();
        assert!(!auth.is_admin());
    }

    #[tokio::test]
    async fn update_role_requires_profile() {
        let dir = TempDir::new().unwrap();
        let mut auth = context(&dir);
        let err = auth.update_role(UserRole::Seller).await.unwrap_err();
        assert_eq!(err.to_string(), "User not logged in");

        auth.on_auth_state_changed(Some(user("u1", "t1")), &Admins(&[]))
            .await
            .unwrap();
        auth.update_role(UserRole::Seller).await.unwrap();
        assert!(auth.is_seller());
    }

    #[test]
    fn different_uid_inherits_previous_role() {
        let previous = UserProfile {
            uid: "old".to_string(),
            email: None,
            display_name: Some("Old Name".to_string()),
            role: UserRole::Seller,
        };
        let (profile, changed) = resolve_profile(Some(previous), &user("new", "t"));

        assert!(changed);
        assert_eq!(profile.uid, "new");
        assert_eq!(profile.role, UserRole::Seller);
        assert_eq!(profile.display_name.as_deref(), Some("Old Name"));
    }
}
