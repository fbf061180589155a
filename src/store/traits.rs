//! Persistence collaborator traits.
//!
//! The intake core sees storage only through these two interfaces: a durable
//! key-value settings table and a profile record store.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::onboarding::model::{NewProfile, Profile, ProfileId};

/// Durable key-value slots, namespaced per user. Values are JSON.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read a setting. `Ok(None)` if the key was never set or was deleted.
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or replace a setting.
    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Delete a setting. Returns whether a row was removed.
    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError>;
}

/// Profile record store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert a profile. The store assigns the identifier and timestamps.
    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, DatabaseError>;

    /// Fetch a profile by identifier.
    async fn get_profile(&self, id: ProfileId) -> Result<Option<Profile>, DatabaseError>;
}
