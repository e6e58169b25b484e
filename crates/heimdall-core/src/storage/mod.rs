//! Tenant and user persistence capability.
//!
//! The pipeline only ever talks to [`Storage`]; [`InMemoryStorage`] backs the
//! binary and the tests. A database-backed implementation plugs in here.

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{StorageResult, ValidationError};
use crate::models::{Role, Tenant, TenantConfig, TenantConfigUpdate, User, UserView};

pub use memory::InMemoryStorage;

/// Key-value lookup of tenants and users.
///
/// Lookups distinguish a missing record ([`StorageError::NotFound`]) from a
/// transport failure ([`StorageError::Backend`]).
///
/// [`StorageError::NotFound`]: crate::error::StorageError::NotFound
/// [`StorageError::Backend`]: crate::error::StorageError::Backend
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant>;

    async fn get_tenant(&self, id: &str) -> StorageResult<Tenant>;

    /// Replaces the tenant's configuration as a whole.
    async fn update_tenant_config(
        &self,
        tenant_id: &str,
        update: &TenantConfigUpdate,
    ) -> StorageResult<TenantConfig>;

    /// Fails with `Conflict` if the username is already taken by any tenant.
    async fn create_user(&self, user: User) -> StorageResult<User>;

    async fn get_user(&self, id: &str) -> StorageResult<User>;

    async fn get_user_by_username(&self, username: &str) -> StorageResult<User>;

    async fn update_user_last_login(&self, id: &str) -> StorageResult<()>;

    async fn list_users(&self, tenant_id: &str, query: &UserQuery) -> StorageResult<UserPage>;
}

/// Column to order a user listing by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    Username,
    Role,
    #[default]
    CreatedAt,
    LastLogin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Paging, search, and ordering for [`Storage::list_users`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserQuery {
    pub page: u32,
    pub page_size: u32,
    /// Substring matched against username and phone.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub sort_by: UserSortField,
    pub sort_dir: SortDirection,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            search: None,
            role: None,
            sort_by: UserSortField::default(),
            sort_dir: SortDirection::default(),
        }
    }
}

impl UserQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page < 1 {
            return Err(ValidationError::new("page", "must be at least 1"));
        }
        if !(1..=100).contains(&self.page_size) {
            return Err(ValidationError::new("page_size", "must be between 1 and 100"));
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }
}

/// One page of a user listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPage {
    pub users: Vec<UserView>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl UserPage {
    pub fn new(users: Vec<UserView>, total: u64, query: &UserQuery) -> Self {
        let page_size = u64::from(query.page_size.max(1));
        Self {
            users,
            total,
            page: query.page,
            page_size: query.page_size,
            total_pages: total.div_ceil(page_size) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_valid() {
        let query = UserQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn page_size_is_bounded() {
        let query = UserQuery {
            page_size: 101,
            ..UserQuery::default()
        };
        assert_eq!(query.validate().unwrap_err().field, "page_size");
    }

    #[test]
    fn page_zero_is_rejected() {
        let query = UserQuery {
            page: 0,
            ..UserQuery::default()
        };
        assert_eq!(query.validate().unwrap_err().field, "page");
    }

    #[test]
    fn total_pages_rounds_up() {
        let query = UserQuery {
            page_size: 10,
            ..UserQuery::default()
        };
        assert_eq!(UserPage::new(Vec::new(), 21, &query).total_pages, 3);
        assert_eq!(UserPage::new(Vec::new(), 20, &query).total_pages, 2);
        assert_eq!(UserPage::new(Vec::new(), 0, &query).total_pages, 0);
    }

    #[test]
    fn query_deserializes_with_defaults() {
        let query: UserQuery = serde_json::from_str(r#"{"sort_by":"username"}"#).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.sort_by, UserSortField::Username);
        assert_eq!(query.sort_dir, SortDirection::Desc);
    }
}
