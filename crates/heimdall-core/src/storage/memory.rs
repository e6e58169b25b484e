use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{SortDirection, Storage, UserPage, UserQuery, UserSortField};
use crate::error::{StorageError, StorageResult};
use crate::models::{Tenant, TenantConfig, TenantConfigUpdate, User};

/// Process-local [`Storage`] over concurrent maps.
#[derive(Default)]
pub struct InMemoryStorage {
    tenants: DashMap<String, Tenant>,
    users: DashMap<String, User>,
    /// username -> user id
    usernames: DashMap<String, String>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_tenant(&self, tenant: Tenant) -> StorageResult<Tenant> {
        match self.tenants.entry(tenant.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(format!(
                "tenant {} already exists",
                tenant.id
            ))),
            Entry::Vacant(slot) => {
                tracing::debug!("Tenant created: id={}, name={}", tenant.id, tenant.name);
                slot.insert(tenant.clone());
                Ok(tenant)
            }
        }
    }

    async fn get_tenant(&self, id: &str) -> StorageResult<Tenant> {
        self.tenants
            .get(id)
            .map(|t| t.clone())
            .ok_or_else(|| StorageError::NotFound(format!("tenant {id}")))
    }

    async fn update_tenant_config(
        &self,
        tenant_id: &str,
        update: &TenantConfigUpdate,
    ) -> StorageResult<TenantConfig> {
        let mut tenant = self
            .tenants
            .get_mut(tenant_id)
            .ok_or_else(|| StorageError::NotFound(format!("tenant {tenant_id}")))?;
        tenant
            .config
            .apply(update)
            .map_err(|e| StorageError::Backend(format!("rejected config update: {e}")))?;
        tenant.updated_at = tenant.config.updated_at;
        Ok(tenant.config.clone())
    }

    async fn create_user(&self, user: User) -> StorageResult<User> {
        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(format!(
                "username {} is taken",
                user.username
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                tracing::debug!("User created: id={}, tenant={}", user.id, user.tenant_id);
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: &str) -> StorageResult<User> {
        self.users
            .get(id)
            .map(|u| u.clone())
            .ok_or_else(|| StorageError::NotFound(format!("user {id}")))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<User> {
        let id = self
            .usernames
            .get(username)
            .map(|id| id.clone())
            .ok_or_else(|| StorageError::NotFound(format!("user {username}")))?;
        self.get_user(&id).await
    }

    async fn update_user_last_login(&self, id: &str) -> StorageResult<()> {
        let mut user = self
            .users
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(format!("user {id}")))?;
        let now = Utc::now();
        user.last_login = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn list_users(&self, tenant_id: &str, query: &UserQuery) -> StorageResult<UserPage> {
        let search = query.search.as_deref().filter(|s| !s.is_empty());

        let mut matched: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.tenant_id == tenant_id)
            .filter(|u| query.role.map_or(true, |role| u.role == role))
            .filter(|u| {
                search.map_or(true, |s| {
                    u.username.contains(s) || u.phone.as_deref().is_some_and(|p| p.contains(s))
                })
            })
            .map(|u| u.clone())
            .collect();

        matched.sort_by(|a, b| {
            let ord = compare_users(a, b, query.sort_by);
            match query.sort_dir {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });

        let total = matched.len() as u64;
        let users = matched
            .into_iter()
            .skip(query.offset())
            .take(query.page_size as usize)
            .map(|u| u.view())
            .collect();

        Ok(UserPage::new(users, total, query))
    }
}

fn compare_users(a: &User, b: &User, field: UserSortField) -> Ordering {
    match field {
        UserSortField::Username => a.username.cmp(&b.username),
        UserSortField::Role => a.role.cmp(&b.role),
        UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        UserSortField::LastLogin => a.last_login.cmp(&b.last_login),
    }
    .then_with(|| a.username.cmp(&b.username))
}
