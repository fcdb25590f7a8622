//! Stripe billing: checkout, billing portal and webhooks

pub mod stripe;
pub mod webhook;

pub use stripe::StripeService;
