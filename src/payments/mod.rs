//! Payment dispatch module
//!
//! This module provides a single entry point for three payment providers
//! (M-Pesa STK push, Flutterwave checkout, PayPal buttons) and normalizes
//! their very different flows into one `PaymentResult`.

pub mod dispatcher;
pub mod gateway;
pub mod phone;
pub mod providers;
pub mod reporter;
pub mod traits;
pub mod types;
pub mod widget;

pub use dispatcher::Dispatcher;
pub use gateway::{PaymentGateway, Widgets};
pub use reporter::{Notification, NotificationLevel, Notifier, ResultReporter};
pub use traits::ProviderAdapter;
pub use types::{
    PaymentForm, PaymentMethod, PaymentRequest, PaymentResult, ProviderOutcome, Settlement,
};
pub use widget::{CheckoutWidget, WidgetCallbacks};
