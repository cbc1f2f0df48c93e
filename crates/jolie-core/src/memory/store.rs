//! ============================================================================
//! Memory Store - Profile rows in a remote REST row-store
//! ============================================================================
//! `MemoryStore` is the capability the orchestrator depends on.
//! `SupabaseStore` implements it over PostgREST-style filtered requests,
//! keyed by equality on the `email` column.
//!
//! Every failure is translated here into a `StoreError`; transport errors
//! never escape as raw reqwest errors.
//! ============================================================================

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use tracing::{debug, info};

use super::types::{ProfileUpdate, UserProfile};
use crate::config::StoreConfig;
use crate::types::StoreError;

/// Column holding the profile identifier
pub const IDENTIFIER_COLUMN: &str = "email";

/// Profile persistence capability
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Point read. `Ok(None)` when no profile exists.
    async fn fetch(&self, identifier: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Insert a new profile, returning the stored rows
    async fn create(&self, profile: &UserProfile) -> Result<Vec<UserProfile>, StoreError>;

    /// Update the given fields, returning the updated rows.
    /// `NotFound` when no row matched.
    async fn update(
        &self,
        identifier: &str,
        update: &ProfileUpdate,
    ) -> Result<Vec<UserProfile>, StoreError>;

    /// Delete a profile. `NotFound` when no row matched.
    async fn delete(&self, identifier: &str) -> Result<(), StoreError>;

    /// Verify the store is reachable
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Memory store backed by a Supabase REST table
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_url: String,
    api_token: String,
}

impl SupabaseStore {
    /// Create a new store client from configuration
    pub fn new(config: &StoreConfig) -> Self {
        debug!("Memory store at {}", config.rest_url);
        Self {
            client: reqwest::Client::new(),
            rest_url: config.rest_url.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.rest_url)
            .header("apikey", &self.api_token)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
    }

    fn by_identifier(&self, method: Method, identifier: &str) -> RequestBuilder {
        self.request(method)
            .query(&[(IDENTIFIER_COLUMN, format!("eq.{}", identifier))])
    }

    async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Request(format!("Failed to reach store: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Request(format!("Store error {}: {}", status, body)));
        }

        Ok(response)
    }

    async fn rows(request: RequestBuilder) -> Result<Vec<UserProfile>, StoreError> {
        let body = Self::send(request)
            .await?
            .text()
            .await
            .map_err(|e| StoreError::Request(format!("Failed to read store response: {}", e)))?;

        // Writes without returned representation answer with an empty body
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&body)
            .map_err(|e| StoreError::Request(format!("Malformed store response: {}", e)))
    }
}

#[async_trait]
impl MemoryStore for SupabaseStore {
    async fn fetch(&self, identifier: &str) -> Result<Option<UserProfile>, StoreError> {
        debug!("Fetching profile for {}", identifier);

        let rows = Self::rows(
            self.by_identifier(Method::GET, identifier)
                .query(&[("select", "*"), ("limit", "1")]),
        )
        .await?;

        Ok(rows.into_iter().next())
    }

    async fn create(&self, profile: &UserProfile) -> Result<Vec<UserProfile>, StoreError> {
        debug!("Creating profile for {}", profile.identifier);

        let rows = Self::rows(
            self.request(Method::POST)
                .header("Prefer", "return=representation")
                .json(profile),
        )
        .await?;

        if rows.is_empty() {
            return Err(StoreError::Request("Supabase insert returned no data".to_string()));
        }

        info!("Created profile for {}", profile.identifier);
        Ok(rows)
    }

    async fn update(
        &self,
        identifier: &str,
        update: &ProfileUpdate,
    ) -> Result<Vec<UserProfile>, StoreError> {
        debug!("Updating profile for {}", identifier);

        let rows = Self::rows(
            self.by_identifier(Method::PATCH, identifier)
                .header("Prefer", "return=representation")
                .json(update),
        )
        .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(identifier.to_string()));
        }

        info!("Updated profile for {}", identifier);
        Ok(rows)
    }

    async fn delete(&self, identifier: &str) -> Result<(), StoreError> {
        info!("Deleting profile for {}", identifier);

        let rows = Self::rows(
            self.by_identifier(Method::DELETE, identifier)
                .header("Prefer", "return=representation"),
        )
        .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound(identifier.to_string()));
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Self::send(
            self.request(Method::GET)
                .query(&[("select", IDENTIFIER_COLUMN), ("limit", "1")]),
        )
        .await?;
        Ok(())
    }
}
