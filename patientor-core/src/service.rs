//! Contract of the remote patient service.

use std::future::Future;

use crate::error::ServiceError;
use crate::model::{DiagnosisCatalog, Entry, NewEntry, Patient, PatientFormValues};

/// Network operations the core relies on.
///
/// Futures must be `Send` so callers can drive them from spawned tasks.
pub trait PatientService: Send + Sync {
    /// `GET /patients`: summaries without entries.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Patient>, ServiceError>> + Send;

    /// `GET /patients/{id}`: the full aggregate including entries.
    fn get_by_id(&self, id: &str) -> impl Future<Output = Result<Patient, ServiceError>> + Send;

    /// `POST /patients`.
    fn create(
        &self,
        values: &PatientFormValues,
    ) -> impl Future<Output = Result<Patient, ServiceError>> + Send;

    /// `POST /patients/{id}/entries`: returns the stored entry with its assigned `id`.
    fn add_entry(
        &self,
        patient_id: &str,
        entry: &NewEntry,
    ) -> impl Future<Output = Result<Entry, ServiceError>> + Send;

    /// `GET /diagnoses`.
    fn get_diagnoses(&self) -> impl Future<Output = Result<DiagnosisCatalog, ServiceError>> + Send;
}
