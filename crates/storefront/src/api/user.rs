//! User service client: authentication, profile and addresses.

use bazaar_core::{
    Address, AddressId, AddressInput, LoginInput, ProfileUpdate, SignupInput, UserId, UserProfile,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{ApiError, CallContext, ServiceClient};

/// Token and profile returned by login, signup and role switch.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct ResetLink {
    #[serde(default)]
    reset_password_link: Option<String>,
}

/// Client for the user service (`/user/...`).
#[derive(Debug, Clone)]
pub struct UserClient {
    http: ServiceClient,
}

impl UserClient {
    #[must_use]
    pub const fn new(http: ServiceClient) -> Self {
        Self { http }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the call fails.
    #[instrument(skip(self, ctx, input))]
    pub async fn login(
        &self,
        ctx: &CallContext,
        input: &LoginInput,
    ) -> Result<AuthSession, ApiError> {
        let req = self.http.request(Method::POST, "/user/login", ctx).json(input);
        self.http.fetch(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the account can't be created.
    #[instrument(skip(self, ctx, input), fields(username = %input.username))]
    pub async fn signup(
        &self,
        ctx: &CallContext,
        input: &SignupInput,
    ) -> Result<AuthSession, ApiError> {
        let req = self.http.request(Method::POST, "/user/signup", ctx).json(input);
        self.http.fetch(req).await
    }

    /// Log in as another role account of the same person.
    ///
    /// # Errors
    ///
    /// Returns an error if the switch is refused.
    #[instrument(skip(self, ctx))]
    pub async fn switch_role(
        &self,
        ctx: &CallContext,
        username: &str,
    ) -> Result<AuthSession, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/switch-role", ctx)
            .json(&json!({ "username": username }));
        self.http.fetch(req).await
    }

    /// Ask for a reset link. Returns the link when the service echoes it back.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is refused.
    #[instrument(skip(self, ctx, email))]
    pub async fn request_password_reset(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<(Option<String>, Option<String>), ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/password/reset/request", ctx)
            .json(&json!({ "email": email }));
        let envelope = self.http.execute::<ResetLink>(req).await?;
        Ok((
            envelope.message,
            envelope.data.and_then(|d| d.reset_password_link),
        ))
    }

    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        ctx: &CallContext,
        token: &str,
        new_password: &str,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/password/reset", ctx)
            .query(&[("token", token)])
            .json(&json!({ "new_password": new_password }));
        self.http.send(req).await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the token is rejected.
    #[instrument(skip(self, ctx))]
    pub async fn profile(&self, ctx: &CallContext) -> Result<UserProfile, ApiError> {
        let req = self.http.request(Method::GET, "/user/profile", ctx);
        self.http.fetch(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the update is refused.
    #[instrument(skip(self, ctx, update))]
    pub async fn update_profile(
        &self,
        ctx: &CallContext,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, ApiError> {
        let req = self
            .http
            .request(Method::PUT, "/user/profile/update", ctx)
            .json(update);
        self.http.fetch(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the mail can't be sent.
    #[instrument(skip(self, ctx, email))]
    pub async fn send_verification(
        &self,
        ctx: &CallContext,
        email: &str,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/verify/send", ctx)
            .json(&json!({ "email": email }));
        self.http.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the account can't be deactivated.
    #[instrument(skip(self, ctx))]
    pub async fn deactivate(
        &self,
        ctx: &CallContext,
        id: UserId,
    ) -> Result<Option<String>, ApiError> {
        let req = self.http.request(Method::POST, &format!("/user/deactivate/{id}"), ctx);
        self.http.send(req).await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the call fails.
    #[instrument(skip(self, ctx))]
    pub async fn addresses(&self, ctx: &CallContext) -> Result<Vec<Address>, ApiError> {
        let req = self.http.request(Method::GET, "/user/address/all", ctx);
        self.http.fetch_or_default(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the address is refused.
    #[instrument(skip(self, ctx, input))]
    pub async fn add_address(
        &self,
        ctx: &CallContext,
        input: &AddressInput,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::POST, "/user/address/add", ctx)
            .json(input);
        self.http.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the address is refused.
    #[instrument(skip(self, ctx, input))]
    pub async fn update_address(
        &self,
        ctx: &CallContext,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::PUT, &format!("/user/address/update/{id}"), ctx)
            .json(input);
        self.http.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the address can't be deleted.
    #[instrument(skip(self, ctx))]
    pub async fn delete_address(
        &self,
        ctx: &CallContext,
        id: AddressId,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::DELETE, &format!("/user/address/delete/{id}"), ctx);
        self.http.send(req).await
    }

    /// # Errors
    ///
    /// Returns an error if the address can't be made primary.
    #[instrument(skip(self, ctx))]
    pub async fn set_primary_address(
        &self,
        ctx: &CallContext,
        id: AddressId,
    ) -> Result<Option<String>, ApiError> {
        let req = self
            .http
            .request(Method::PUT, &format!("/user/address/set-primary/{id}"), ctx);
        self.http.send(req).await
    }
}
