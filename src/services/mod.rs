// Service exports
pub mod cache;
pub mod identity;
pub mod postgres;
pub mod profiles;
pub mod resources;
pub mod store;
pub mod supabase;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use identity::{IdentityError, IdentityProvider, JwtIdentity};
pub use postgres::{PostgresClient, PostgresError};
pub use profiles::CachedProfileStore;
pub use resources::ResourceCatalog;
pub use store::{sort_sessions_desc, ProfileStore, SessionStore, StoreError};
pub use supabase::{SupabaseClient, SupabaseError, SupabaseTables};
