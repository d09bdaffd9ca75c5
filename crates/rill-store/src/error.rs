#![forbid(unsafe_code)]

//! Error types for the broadcast boundary.
//!
//! Only one error crosses module lines here: [`ConsumerError`], raised by a
//! fallible consumer during broadcast. It is always contained at the
//! broadcast boundary — reported through the store's error hook, never
//! allowed to abort delivery to the remaining subscribers or to touch the
//! state cell. Transition failures are the caller-chosen error type of a
//! fallible handler and propagate synchronously to the handler's caller
//! instead.

/// Failure reported by a fallible consumer during broadcast.
///
/// Carried to the store's error hook together with the [`SubscriberId`] of
/// the failing consumer.
///
/// [`SubscriberId`]: crate::registry::SubscriberId
#[derive(Debug, Clone)]
pub struct ConsumerError {
    message: String,
}

impl ConsumerError {
    /// Create a consumer error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConsumerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "consumer failed: {}", self.message)
    }
}

impl std::error::Error for ConsumerError {}
