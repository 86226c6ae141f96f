//! Payment gateway client trait.
//!
//! The actual gateway HTTP integration lives outside the core; the engine
//! only depends on this request/response seam.

use super::{
    errors::PaymentResult,
    models::{CardPaymentRequest, GatewayPayment, PaymentRequest},
};
use async_trait::async_trait;

/// Opaque external payment processor.
///
/// Implementations must be safe to call concurrently. Results reported
/// asynchronously (webhooks) flow back into the core through
/// [`PaymentManager::on_payment_result`], which is idempotent, so a gateway
/// delivering the same notification several times is harmless.
///
/// [`PaymentManager::on_payment_result`]: super::PaymentManager::on_payment_result
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an instant-transfer (PIX) payment the payer completes out of band
    async fn create_pix_payment(&self, request: &PaymentRequest) -> PaymentResult<GatewayPayment>;

    /// Charge a tokenized card, possibly approving synchronously
    async fn create_card_payment(
        &self,
        request: &CardPaymentRequest,
    ) -> PaymentResult<GatewayPayment>;

    /// Look up the current gateway-side state of a payment
    async fn get_payment(&self, payment_id: &str) -> PaymentResult<GatewayPayment>;
}
