//! Embedded checkout widget capability
//!
//! Vendor checkout widgets live in the host page (or any other UI runtime).
//! Adapters never talk to them directly: the host injects a `CheckoutWidget`
//! and reports back through the single-use `WidgetCallbacks` handle.

use crate::error::ProviderResult;
use tokio::sync::oneshot;
use tracing::debug;

/// What the widget reported.
#[derive(Debug)]
pub enum WidgetEvent<T> {
    /// Completion callback fired with the vendor payload
    Completed(T),
    /// The payer closed the widget without completing
    Closed,
    /// The widget reported an error
    Failed(String),
}

/// Handle passed to `CheckoutWidget::open`.
///
/// Every method consumes the handle, so only the first event is observed.
/// Dropping it without firing counts as a close.
#[derive(Debug)]
pub struct WidgetCallbacks<T> {
    tx: oneshot::Sender<WidgetEvent<T>>,
}

impl<T> WidgetCallbacks<T> {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<WidgetEvent<T>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// onComplete
    pub fn complete(self, payload: T) {
        self.send(WidgetEvent::Completed(payload));
    }

    /// onClose
    pub fn close(self) {
        self.send(WidgetEvent::Closed);
    }

    /// onError
    pub fn fail(self, message: impl Into<String>) {
        self.send(WidgetEvent::Failed(message.into()));
    }

    fn send(self, event: WidgetEvent<T>) {
        if self.tx.send(event).is_err() {
            debug!("Checkout widget event arrived after the payment was abandoned");
        }
    }
}

/// A vendor checkout widget supplied by the host.
pub trait CheckoutWidget: Send + Sync {
    /// Everything the widget needs to render
    type Config: Send;
    /// Payload of the completion callback
    type Completion: Send;

    /// Open the widget and return immediately.
    ///
    /// Fails when the host cannot show the widget at all, for example because
    /// the vendor script never loaded.
    fn open(
        &self,
        config: Self::Config,
        callbacks: WidgetCallbacks<Self::Completion>,
    ) -> ProviderResult<()>;
}

/// Open `widget` and wait for its first event.
pub(crate) async fn run_widget<W>(widget: &W, config: W::Config) -> ProviderResult<WidgetEvent<W::Completion>>
where
    W: CheckoutWidget + ?Sized,
{
    let (callbacks, rx) = WidgetCallbacks::channel();
    widget.open(config, callbacks)?;
    Ok(rx.await.unwrap_or(WidgetEvent::Closed))
}
