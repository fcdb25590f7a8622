//! Data store modules for Supabase integration

pub mod history;
pub mod subscriptions;
pub mod supabase;

pub use history::HistoryStore;
pub use subscriptions::SubscriptionStore;
pub use supabase::SupabaseClient;
