//! Payment processing: charge gateway boundary, persisted confirmations,
//! and the RPC surface consumed by the reservations service.

use async_trait::async_trait;
use bson::Uuid;
use repolayer_core::{client::StoreClient, filter::Filter, repository::Repository};
use repolayer_macros::Document;
use serde::{Deserialize, Serialize};
use std::{ops::Deref, sync::Arc};
use thiserror::Error;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

/// Card details forwarded to the charge gateway. Never logged in the clear.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
}

impl CardDetails {
    /// The last four digits, the only part of the number safe to surface.
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self.number.chars().collect();
        digits[digits.len().saturating_sub(4)..].iter().collect()
    }
}

/// A request to charge a card. Amounts are in the currency's minor unit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateCharge {
    pub card: CardDetails,
    pub amount_cents: i64,
}

/// A persisted record of a settled charge.
#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[document(collection = "payments")]
pub struct Payment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// The gateway's reference for the settled charge.
    pub provider_ref: String,
    pub amount_cents: i64,
    #[document(redact)]
    pub card: CardDetails,
    pub created_at: bson::DateTime,
}

/// What a caller gets back after a successful charge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Identifier of the persisted [`Payment`] record.
    pub payment_id: Uuid,
    pub provider_ref: String,
    pub amount_cents: i64,
}

/// A charge the gateway refused or could not complete.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ChargeError(pub String);

/// Boundary to the external payment provider.
///
/// The provider integration itself lives behind this trait; the service
/// only needs a settled-or-refused answer and a provider reference.
#[async_trait]
pub trait ChargeGateway: Send + Sync {
    async fn charge(&self, card: &CardDetails, amount_cents: i64) -> Result<String, ChargeError>;
}

/// RPC surface other services call to take a payment.
///
/// In-process deployments hand out the [`PaymentsService`] itself; remote
/// deployments put a transport client behind the same trait.
#[async_trait]
pub trait PaymentsRpc: Send + Sync {
    async fn create_charge(&self, request: CreateCharge) -> ServiceResult<PaymentConfirmation>;
}

#[derive(Clone, Debug)]
pub struct PaymentRepository(Repository<Payment>);

impl PaymentRepository {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self(Repository::new(client))
    }

    pub async fn find_by_id(&self, id: Uuid) -> repolayer_core::error::RepositoryResult<Payment> {
        self.0.find_one(&Filter::eq("id", id)).await
    }
}

impl Deref for PaymentRepository {
    type Target = Repository<Payment>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct PaymentsService<G> {
    repository: PaymentRepository,
    gateway: G,
}

impl<G: ChargeGateway> PaymentsService<G> {
    pub fn new(repository: PaymentRepository, gateway: G) -> Self {
        Self { repository, gateway }
    }

    /// Charges the card through the gateway and persists the confirmation.
    ///
    /// The charge happens first; a storage failure after settlement still
    /// surfaces as an error, but the provider reference is in the message so
    /// the charge can be reconciled.
    pub async fn create_charge(&self, request: CreateCharge) -> ServiceResult<Payment> {
        if request.amount_cents <= 0 {
            return Err(ServiceError::InvalidRequest(
                "charge amount must be positive".to_string(),
            ));
        }

        let provider_ref = self
            .gateway
            .charge(&request.card, request.amount_cents)
            .await
            .map_err(|err| ServiceError::PaymentFailed(err.to_string()))?;

        let card_tail = request.card.last_four();
        let payment = self
            .repository
            .create(&Payment {
                id: None,
                provider_ref: provider_ref.clone(),
                amount_cents: request.amount_cents,
                card: request.card,
                created_at: bson::DateTime::now(),
            })
            .await?;

        info!(
            payment = %provider_ref,
            card = %card_tail,
            amount_cents = request.amount_cents,
            "charge settled",
        );

        Ok(payment)
    }

    pub async fn find_by_id(&self, id: Uuid) -> ServiceResult<Payment> {
        Ok(self.repository.find_by_id(id).await?)
    }
}

#[async_trait]
impl<G: ChargeGateway> PaymentsRpc for PaymentsService<G> {
    async fn create_charge(&self, request: CreateCharge) -> ServiceResult<PaymentConfirmation> {
        let payment = PaymentsService::create_charge(self, request).await?;

        Ok(PaymentConfirmation {
            payment_id: payment
                .id
                .ok_or_else(|| ServiceError::Storage(
                    repolayer_core::error::RepositoryError::Serialization(
                        "persisted payment is missing its identifier".to_string(),
                    ),
                ))?,
            provider_ref: payment.provider_ref,
            amount_cents: payment.amount_cents,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use repolayer_memory::InMemoryClient;

    pub(crate) struct StubGateway {
        pub refuse: bool,
    }

    #[async_trait]
    impl ChargeGateway for StubGateway {
        async fn charge(&self, _card: &CardDetails, amount_cents: i64) -> Result<String, ChargeError> {
            if self.refuse {
                Err(ChargeError("card declined".to_string()))
            } else {
                Ok(format!("ch_{amount_cents}"))
            }
        }
    }

    pub(crate) fn test_card() -> CardDetails {
        CardDetails {
            number: "4242424242424242".to_string(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "314".to_string(),
        }
    }

    fn service(refuse: bool) -> PaymentsService<StubGateway> {
        let client = Arc::new(InMemoryClient::new());
        PaymentsService::new(PaymentRepository::new(client), StubGateway { refuse })
    }

    #[test]
    fn last_four_never_splits_characters() {
        assert_eq!(test_card().last_four(), "4242");

        let mut short = test_card();
        short.number = "42".to_string();
        assert_eq!(short.last_four(), "42");

        // a malformed number must not panic on char boundaries
        let mut odd = test_card();
        odd.number = "4242-číslo".to_string();
        assert_eq!(odd.last_four(), "íslo");
    }

    #[tokio::test]
    async fn settled_charges_are_persisted() {
        let service = service(false);

        let payment = service
            .create_charge(CreateCharge { card: test_card(), amount_cents: 4200 })
            .await
            .unwrap();

        assert_eq!(payment.provider_ref, "ch_4200");
        let reloaded = service.find_by_id(payment.id.unwrap()).await.unwrap();
        assert_eq!(reloaded, payment);
    }

    #[tokio::test]
    async fn refused_charges_are_not_persisted() {
        let service = service(true);

        let err = service
            .create_charge(CreateCharge { card: test_card(), amount_cents: 4200 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PaymentFailed(_)));

        let lookup = service.repository.find(&Filter::all(), &Default::default()).await.unwrap();
        assert_eq!(lookup.total, 0);
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected_before_the_gateway() {
        let service = service(true); // gateway would refuse, but is never reached

        let err = service
            .create_charge(CreateCharge { card: test_card(), amount_cents: 0 })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn rpc_confirmation_carries_the_payment_identifier() {
        let service = service(false);

        let confirmation = PaymentsRpc::create_charge(
            &service,
            CreateCharge { card: test_card(), amount_cents: 999 },
        )
        .await
        .unwrap();

        assert_eq!(confirmation.amount_cents, 999);
        let payment = service.find_by_id(confirmation.payment_id).await.unwrap();
        assert_eq!(payment.provider_ref, confirmation.provider_ref);
    }
}
