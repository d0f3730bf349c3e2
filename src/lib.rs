pub mod config;
pub mod error;
pub mod payments;

#[cfg(feature = "server")]
pub mod api;

pub use error::{ErrorKind, PaymentError, ProviderResult};
