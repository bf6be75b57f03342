//! Draft state and validation for creating a new entry.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::model::{
    DiagnosisCatalog, Discharge, Entry, EntryDetails, EntryKind, HealthCheckRating, NewEntry,
    NewEntryBase, SickLeave,
};
use crate::service::PatientService;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Superset of every variant's fields.
///
/// Fields that do not belong to `kind` are kept so switching back restores
/// them, and are dropped when the payload is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EntryDraft {
    pub kind: EntryKind,
    pub description: String,
    pub date: String,
    pub specialist: String,
    pub health_check_rating: Option<i64>,
    pub discharge: Discharge,
    pub employer_name: String,
    pub sick_leave: SickLeave,
    pub diagnosis_codes: Vec<String>,
}

/// Draft field a validation issue refers to.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum DraftField {
    Description,
    Date,
    Specialist,
    HealthCheckRating,
    DischargeDate,
    DischargeCriteria,
    EmployerName,
    SickLeaveStart,
    SickLeaveEnd,
}

impl DraftField {
    /// Wire path of the field.
    pub fn path(self) -> &'static str {
        match self {
            DraftField::Description => "description",
            DraftField::Date => "date",
            DraftField::Specialist => "specialist",
            DraftField::HealthCheckRating => "healthCheckRating",
            DraftField::DischargeDate => "discharge.date",
            DraftField::DischargeCriteria => "discharge.criteria",
            DraftField::EmployerName => "employerName",
            DraftField::SickLeaveStart => "sickLeave.startDate",
            DraftField::SickLeaveEnd => "sickLeave.endDate",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "problem", rename_all = "snake_case")]
pub enum Problem {
    Missing,
    InvalidDate,
    RatingOutOfRange { value: i64 },
    /// One half of a date range was filled in without the other.
    IncompleteRange,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: DraftField,
    #[serde(flatten)]
    pub problem: Problem,
}

impl FieldIssue {
    fn new(field: DraftField, problem: Problem) -> Self {
        Self { field, problem }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.field.path();
        match &self.problem {
            Problem::Missing => write!(f, "{path} is required"),
            Problem::InvalidDate => write!(f, "{path} must be a date in YYYY-MM-DD format"),
            Problem::RatingOutOfRange { value } => {
                write!(f, "{path} must be between 0 and 3, received {value}")
            }
            Problem::IncompleteRange => {
                write!(f, "{path} is required when the other sick leave date is set")
            }
        }
    }
}

/// Every problem found in a draft, in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_issues(.0))]
pub struct ValidationErrors(Vec<FieldIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[FieldIssue] {
        &self.0
    }

    pub fn has(&self, field: DraftField) -> bool {
        self.0.iter().any(|issue| issue.field == field)
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a submission did not produce an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SubmitError {
    /// Text for the form alert.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Invalid(errors) => errors.to_string(),
            SubmitError::Service(err) => err.user_message(),
        }
    }
}

impl EntryDraft {
    /// Check required fields for the active kind and build its payload.
    pub fn validate(&self) -> Result<NewEntry, ValidationErrors> {
        let mut issues = Vec::new();

        let description = required(&mut issues, DraftField::Description, &self.description);
        let date = required_date(&mut issues, DraftField::Date, &self.date);
        let specialist = required(&mut issues, DraftField::Specialist, &self.specialist);
        let details = self.variant_details(&mut issues);

        match (description, date, specialist, details) {
            (Some(description), Some(date), Some(specialist), Some(details))
                if issues.is_empty() =>
            {
                Ok(NewEntry {
                    base: NewEntryBase {
                        description,
                        date,
                        specialist,
                        diagnosis_codes: dedup_codes(&self.diagnosis_codes),
                    },
                    details,
                })
            }
            _ => Err(ValidationErrors(issues)),
        }
    }

    fn variant_details(&self, issues: &mut Vec<FieldIssue>) -> Option<EntryDetails> {
        match self.kind {
            EntryKind::HealthCheck => {
                let Some(raw) = self.health_check_rating else {
                    issues.push(FieldIssue::new(DraftField::HealthCheckRating, Problem::Missing));
                    return None;
                };
                match HealthCheckRating::try_from(raw) {
                    Ok(health_check_rating) => Some(EntryDetails::HealthCheck {
                        health_check_rating,
                    }),
                    Err(_) => {
                        issues.push(FieldIssue::new(
                            DraftField::HealthCheckRating,
                            Problem::RatingOutOfRange { value: raw },
                        ));
                        None
                    }
                }
            }
            EntryKind::Hospital => {
                let date = required_date(issues, DraftField::DischargeDate, &self.discharge.date);
                let criteria = required(
                    issues,
                    DraftField::DischargeCriteria,
                    &self.discharge.criteria,
                );
                Some(EntryDetails::Hospital {
                    discharge: Discharge {
                        date: date?,
                        criteria: criteria?,
                    },
                })
            }
            EntryKind::OccupationalHealthcare => {
                let employer_name =
                    required(issues, DraftField::EmployerName, &self.employer_name);
                let sick_leave = self.sick_leave_details(issues)?;
                Some(EntryDetails::OccupationalHealthcare {
                    employer_name: employer_name?,
                    sick_leave,
                })
            }
        }
    }

    /// `Some(None)` when no sick leave was entered, `None` when it is invalid.
    fn sick_leave_details(&self, issues: &mut Vec<FieldIssue>) -> Option<Option<SickLeave>> {
        let start = self.sick_leave.start_date.trim();
        let end = self.sick_leave.end_date.trim();

        match (start.is_empty(), end.is_empty()) {
            (true, true) => Some(None),
            (false, true) => {
                issues.push(FieldIssue::new(
                    DraftField::SickLeaveEnd,
                    Problem::IncompleteRange,
                ));
                None
            }
            (true, false) => {
                issues.push(FieldIssue::new(
                    DraftField::SickLeaveStart,
                    Problem::IncompleteRange,
                ));
                None
            }
            (false, false) => {
                let start_date = required_date(issues, DraftField::SickLeaveStart, start);
                let end_date = required_date(issues, DraftField::SickLeaveEnd, end);
                Some(Some(SickLeave {
                    start_date: start_date?,
                    end_date: end_date?,
                }))
            }
        }
    }
}

fn required(issues: &mut Vec<FieldIssue>, field: DraftField, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        issues.push(FieldIssue::new(field, Problem::Missing));
        return None;
    }
    Some(value.to_string())
}

fn required_date(issues: &mut Vec<FieldIssue>, field: DraftField, value: &str) -> Option<String> {
    let value = required(issues, field, value)?;
    if NaiveDate::parse_from_str(&value, DATE_FORMAT).is_err() {
        issues.push(FieldIssue::new(field, Problem::InvalidDate));
        return None;
    }
    Some(value)
}

fn dedup_codes(codes: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        if !unique.contains(code) {
            unique.push(code.clone());
        }
    }
    unique
}

/// Entry creation form bound to one patient and the diagnosis catalog.
#[derive(Debug, Clone)]
pub struct EntryFormModel {
    patient_id: String,
    catalog: Arc<DiagnosisCatalog>,
    draft: EntryDraft,
    issues: Vec<FieldIssue>,
}

impl EntryFormModel {
    pub fn new(patient_id: impl Into<String>, catalog: Arc<DiagnosisCatalog>) -> Self {
        Self {
            patient_id: patient_id.into(),
            catalog,
            draft: EntryDraft::default(),
            issues: Vec::new(),
        }
    }

    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    pub fn catalog(&self) -> &DiagnosisCatalog {
        &self.catalog
    }

    pub fn draft(&self) -> &EntryDraft {
        &self.draft
    }

    pub fn kind(&self) -> EntryKind {
        self.draft.kind
    }

    /// Issues from the last rejected submission.
    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Switch variant. Values typed for other variants are kept.
    pub fn set_kind(&mut self, kind: EntryKind) {
        self.draft.kind = kind;
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.draft.description = value.into();
    }

    pub fn set_date(&mut self, value: impl Into<String>) {
        self.draft.date = value.into();
    }

    pub fn set_specialist(&mut self, value: impl Into<String>) {
        self.draft.specialist = value.into();
    }

    pub fn set_health_check_rating(&mut self, value: Option<i64>) {
        self.draft.health_check_rating = value;
    }

    pub fn set_discharge_date(&mut self, value: impl Into<String>) {
        self.draft.discharge.date = value.into();
    }

    pub fn set_discharge_criteria(&mut self, value: impl Into<String>) {
        self.draft.discharge.criteria = value.into();
    }

    pub fn set_employer_name(&mut self, value: impl Into<String>) {
        self.draft.employer_name = value.into();
    }

    pub fn set_sick_leave_start(&mut self, value: impl Into<String>) {
        self.draft.sick_leave.start_date = value.into();
    }

    pub fn set_sick_leave_end(&mut self, value: impl Into<String>) {
        self.draft.sick_leave.end_date = value.into();
    }

    /// Add a catalog code to the selection, keeping selection order.
    ///
    /// Returns `false` when the code was already selected or is not offered
    /// by the catalog.
    pub fn select_diagnosis(&mut self, code: &str) -> bool {
        if !self.catalog.contains(code) {
            tracing::warn!(code, "diagnosis code is not in the catalog, ignoring");
            return false;
        }
        if self.draft.diagnosis_codes.iter().any(|selected| selected == code) {
            return false;
        }
        self.draft.diagnosis_codes.push(code.to_string());
        true
    }

    pub fn deselect_diagnosis(&mut self, code: &str) -> bool {
        let before = self.draft.diagnosis_codes.len();
        self.draft.diagnosis_codes.retain(|selected| selected != code);
        before != self.draft.diagnosis_codes.len()
    }

    pub fn selected_diagnoses(&self) -> &[String] {
        &self.draft.diagnosis_codes
    }

    pub fn validate(&self) -> Result<NewEntry, ValidationErrors> {
        self.draft.validate()
    }

    /// Clear the draft back to its initial state.
    pub fn reset(&mut self) {
        self.draft = EntryDraft::default();
        self.issues.clear();
    }

    /// Validate and post the draft.
    ///
    /// Nothing is sent when validation fails. The draft survives a service
    /// failure so the user can retry, and is reset once the entry is stored.
    pub async fn submit<S: PatientService>(&mut self, service: &S) -> Result<Entry, SubmitError> {
        let payload = match self.validate() {
            Ok(payload) => payload,
            Err(errors) => {
                tracing::debug!(patient_id = %self.patient_id, %errors, "entry draft rejected");
                self.issues = errors.issues().to_vec();
                return Err(errors.into());
            }
        };
        self.issues.clear();

        match service.add_entry(&self.patient_id, &payload).await {
            Ok(entry) => {
                tracing::info!(
                    patient_id = %self.patient_id,
                    entry_id = %entry.id(),
                    kind = ?payload.kind(),
                    "entry added"
                );
                self.reset();
                Ok(entry)
            }
            Err(err) => {
                tracing::error!(patient_id = %self.patient_id, error = %err, "failed to add entry");
                Err(err.into())
            }
        }
    }
}
