//! Domain records: tenants with their configuration, and users.

pub mod tenant;
pub mod user;

pub use tenant::{AuthMethod, Tenant, TenantConfig, TenantConfigUpdate, TenantView};
pub use user::{Role, User, UserView};
