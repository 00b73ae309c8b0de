//! Entity repositories and services for the reservation platform.
//!
//! Each entity binds the generic repository to its collection and adds the
//! named lookups its service needs. The services own the business rules:
//! users hash credentials before anything is stored, reservations take
//! payment through the [`payments::PaymentsRpc`] boundary before booking,
//! and payments talk to the provider through the opaque
//! [`payments::ChargeGateway`].

#[allow(unused_extern_crates)]
extern crate self as repolayer_services;

pub mod error;
pub mod payments;
pub mod reservations;
pub mod users;

pub use error::{ServiceError, ServiceResult};
