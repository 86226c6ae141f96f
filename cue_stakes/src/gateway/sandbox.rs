//! Sandbox gateway for development and tests.
//!
//! Behaves like the real processor's test credentials: PIX payments stay
//! pending until a webhook arrives, card payments approve synchronously,
//! lookups report approved. No network calls are made.

use super::{
    client::PaymentGateway,
    errors::PaymentResult,
    models::{CardPaymentRequest, GatewayPayment, PaymentRequest, PaymentStatus},
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

/// Offline stand-in for the external payment processor
#[derive(Debug, Clone, Default)]
pub struct SandboxGateway;

impl SandboxGateway {
    pub fn new() -> Self {
        Self
    }

    fn payment_id() -> String {
        format!("sandbox-{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_pix_payment(&self, request: &PaymentRequest) -> PaymentResult<GatewayPayment> {
        let payment_id = Self::payment_id();
        let qr_code = format!("00020126580014br.gov.bcb.pix{payment_id}");

        Ok(GatewayPayment {
            payment_id,
            status: PaymentStatus::Pending,
            amount: request.amount,
            external_reference: Some(request.external_reference.clone()),
            qr_code_base64: None,
            qr_code: Some(qr_code),
            ticket_url: None,
            expires_at: Some(Utc::now() + Duration::minutes(30)),
        })
    }

    async fn create_card_payment(
        &self,
        request: &CardPaymentRequest,
    ) -> PaymentResult<GatewayPayment> {
        Ok(GatewayPayment {
            payment_id: Self::payment_id(),
            status: PaymentStatus::Approved,
            amount: request.amount,
            external_reference: Some(request.external_reference.clone()),
            qr_code: None,
            qr_code_base64: None,
            ticket_url: None,
            expires_at: None,
        })
    }

    async fn get_payment(&self, payment_id: &str) -> PaymentResult<GatewayPayment> {
        Ok(GatewayPayment {
            payment_id: payment_id.to_string(),
            status: PaymentStatus::Approved,
            amount: 0,
            external_reference: None,
            qr_code: None,
            qr_code_base64: None,
            ticket_url: None,
            expires_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pix_stays_pending_until_webhook() {
        let gateway = SandboxGateway::new();
        let payment = gateway
            .create_pix_payment(&PaymentRequest {
                amount: 1_000,
                description: "Deposit".to_string(),
                external_reference: "deposit_2_abc".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert!(payment.qr_code.is_some());
        assert_eq!(payment.external_reference.as_deref(), Some("deposit_2_abc"));
    }

    #[tokio::test]
    async fn test_card_approves_synchronously() {
        let gateway = SandboxGateway::new();
        let payment = gateway
            .create_card_payment(&CardPaymentRequest {
                amount: 5_000,
                description: "Deposit".to_string(),
                external_reference: "deposit_2_def".to_string(),
                card_token: "tok_test".to_string(),
                installments: 1,
            })
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Approved);
    }
}
