use crate::error::ModelProviderError;
use crate::request::ModelRequest;
use crate::response::ModelResponse;

/// A type that represents a model provider, the entry point for sampling
/// completions.
///
/// Once created, a provider should behave like a stateless object. Every
/// request carries the complete conversation, so callers never rely on
/// anything the provider remembers between requests.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// The response type for this provider.
    type Response: ModelResponse<Error = Self::Error>;

    /// Returns a short human-readable name of the backing model, used in
    /// diagnostics.
    fn model_name(&self) -> &str;

    /// Sends a request to the model.
    ///
    /// The returned future must not borrow `self` or `req`, so that it can
    /// be moved into a spawned task or a retry loop.
    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
