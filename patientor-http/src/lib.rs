//! HTTP implementation of [`patientor_core::PatientService`].
//!
//! Talks JSON to the patientor backend:
//! - `GET /patients`, `GET /patients/{id}`, `POST /patients`
//! - `POST /patients/{id}/entries`
//! - `GET /diagnoses`

mod client;
mod config;
mod error;
mod http;

pub use client::HttpPatientService;
pub use config::ClientConfig;
pub use error::HttpError;
