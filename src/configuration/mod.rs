//! Configuration documents cached by the [`ConfigurationManager`](crate::ConfigurationManager).
//!
//! [`OpenIdConnectConfiguration`] and [`JsonWebKeySet`] cover the two common
//! remote documents. Any other type can be cached as well; implement
//! [`AsBaseConfiguration`] for it to expose issuer and signing keys to the
//! signature-failure classifier.

mod base;
mod jwk;
mod oidc;

pub use base::{AsBaseConfiguration, BaseConfiguration};
pub use jwk::{JsonWebKey, JsonWebKeyError, JsonWebKeySet};
pub use oidc::OpenIdConnectConfiguration;
