//! Composition Coach server library
//!
//! Backs the English composition practice app:
//! - practice problems and answer evaluation through Claude, with an
//!   offline fallback
//! - Supabase auth verification and admin user creation
//! - Stripe subscription checkout, billing portal and webhooks
//! - hosting of the built single-page front end

pub mod app;
pub mod config;
pub mod evaluator;
pub mod http;
pub mod payments;
pub mod practice;
pub mod store;
pub mod util;
