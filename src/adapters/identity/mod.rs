//! Identity adapters. Implement IdentityPort.

pub mod static_identity;
pub mod supabase_auth;

pub use static_identity::StaticIdentityAdapter;
pub use supabase_auth::SupabaseAuthAdapter;
