//! Core model of a patient's medical history: entry variants, their
//! rendering against the diagnosis catalog, and the new-entry form.

pub mod error;
pub mod form;
pub mod model;
pub mod render;
pub mod service;

pub use error::{ModelError, ServiceError, GENERIC_FAILURE_MESSAGE};
pub use form::{
    DraftField, EntryDraft, EntryFormModel, FieldIssue, Problem, SubmitError, ValidationErrors,
};
pub use model::{
    BaseEntry, Diagnosis, DiagnosisCatalog, Discharge, Entry, EntryDetails, EntryKind, Gender,
    HealthCheckRating, NewEntry, NewEntryBase, Patient, PatientFormValues, SickLeave,
};
pub use render::{
    render_entry, render_patient, EntrySummary, PatientPage, RenderedDiagnosis, RenderedEntry,
    UNKNOWN_ENTRY_LABEL,
};
pub use service::PatientService;
