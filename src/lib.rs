//! Date normalization for store-onboarding document exports.
//!
//! [`normalizer::Normalizer`] is the single conversion entry point: it turns
//! any [`temporal::TemporalValue`] into a [`temporal::CanonicalInstant`] (or
//! reports why it cannot), renders instants for display and orders them for
//! list views. The remaining modules drive it over JSON Lines files.

pub mod config;
pub mod documents;
pub mod error;
pub mod input;
pub mod normalizer;
pub mod output;
pub mod parsers;
pub mod temporal;

pub use error::NormalizeError;
pub use normalizer::{DisplayPattern, Normalizer, UnsetPlacement, classify};
pub use temporal::{CanonicalInstant, ServerTimestamp, Shape, TemporalValue};
