//! Reservations: booking lifecycle, with payment taken through the
//! payments RPC boundary before anything is persisted.

use bson::Uuid;
use chrono::{DateTime, Utc};
use repolayer_core::{
    client::StoreClient,
    filter::Filter,
    page::{Page, PageRequest},
    repository::Repository,
    update::UpdateSpec,
};
use repolayer_macros::Document;
use serde::{Deserialize, Serialize};
use std::{ops::Deref, sync::Arc};
use tracing::info;

use crate::{
    error::{ServiceError, ServiceResult},
    payments::{CreateCharge, PaymentsRpc},
};

#[derive(Document, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[document(collection = "reservations")]
pub struct Reservation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Owner; assigned from the authenticated caller, never from the request.
    pub user_id: Uuid,
    pub place_id: String,
    pub invoice_id: String,
    pub start_date: bson::DateTime,
    pub end_date: bson::DateTime,
    /// When the booking was taken.
    pub timestamp: bson::DateTime,
    /// The settled charge backing this booking.
    pub payment_id: Uuid,
}

/// A booking request as it arrives from the caller.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateReservation {
    pub place_id: String,
    pub invoice_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub charge: CreateCharge,
}

/// Fields a caller may change after booking. Unset fields stay untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateReservation {
    pub place_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateReservation {
    fn to_update(&self) -> UpdateSpec {
        let mut update = UpdateSpec::new();
        if let Some(place_id) = &self.place_id {
            update = update.set("place_id", place_id.as_str());
        }
        if let Some(start_date) = self.start_date {
            update = update.set("start_date", bson::DateTime::from_chrono(start_date));
        }
        if let Some(end_date) = self.end_date {
            update = update.set("end_date", bson::DateTime::from_chrono(end_date));
        }
        update
    }
}

#[derive(Clone, Debug)]
pub struct ReservationRepository(Repository<Reservation>);

impl ReservationRepository {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self(Repository::new(client))
    }

    pub async fn find_by_id(&self, id: Uuid) -> repolayer_core::error::RepositoryResult<Reservation> {
        self.0.find_one(&Filter::eq("id", id)).await
    }

    pub async fn find_by_user(
        &self,
        user_id: Uuid,
        page: &PageRequest,
    ) -> repolayer_core::error::RepositoryResult<Page<Reservation>> {
        self.0.find(&Filter::eq("user_id", user_id), page).await
    }
}

impl Deref for ReservationRepository {
    type Target = Repository<Reservation>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Clone)]
pub struct ReservationsService {
    repository: ReservationRepository,
    payments: Arc<dyn PaymentsRpc>,
}

impl ReservationsService {
    pub fn new(repository: ReservationRepository, payments: Arc<dyn PaymentsRpc>) -> Self {
        Self { repository, payments }
    }

    /// Books a reservation for the given user.
    ///
    /// The charge is taken first; only a settled payment results in a
    /// persisted booking. Server-assigned fields (owner, booking timestamp,
    /// payment reference) come from this service, not the request.
    pub async fn create(
        &self,
        request: CreateReservation,
        user_id: Uuid,
    ) -> ServiceResult<Reservation> {
        if request.end_date <= request.start_date {
            return Err(ServiceError::InvalidRequest(
                "the reservation must end after it starts".to_string(),
            ));
        }

        let confirmation = self.payments.create_charge(request.charge).await?;

        let reservation = self
            .repository
            .create(&Reservation {
                id: None,
                user_id,
                place_id: request.place_id,
                invoice_id: request.invoice_id,
                start_date: bson::DateTime::from_chrono(request.start_date),
                end_date: bson::DateTime::from_chrono(request.end_date),
                timestamp: bson::DateTime::now(),
                payment_id: confirmation.payment_id,
            })
            .await?;

        info!(
            user = %user_id,
            place = %reservation.place_id,
            payment = %confirmation.provider_ref,
            "reservation booked",
        );

        Ok(reservation)
    }

    pub async fn find_all(&self, page: &PageRequest) -> ServiceResult<Page<Reservation>> {
        Ok(self.repository.find(&Filter::all(), page).await?)
    }

    pub async fn find_one(&self, id: Uuid) -> ServiceResult<Reservation> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: &UpdateReservation,
    ) -> ServiceResult<Reservation> {
        let update = request.to_update();
        if update.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "the update names no fields".to_string(),
            ));
        }

        Ok(self
            .repository
            .find_one_and_update(&Filter::eq("id", id), &update)
            .await?)
    }

    pub async fn remove(&self, id: Uuid) -> ServiceResult<Reservation> {
        Ok(self
            .repository
            .find_one_and_delete(&Filter::eq("id", id))
            .await?)
    }
}
