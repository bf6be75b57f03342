//! Patient, entry and diagnosis types as exchanged with the patient service.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::ModelError;

/// A diagnosis from the reference catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnosis {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latin: Option<String>,
}

impl Diagnosis {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            latin: None,
        }
    }
}

/// Ordered, read-only collection of diagnoses fetched once per session.
///
/// The catalog may be partial or stale relative to the codes stored on
/// entries, so every lookup answers "no match" instead of failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DiagnosisCatalog {
    diagnoses: Vec<Diagnosis>,
}

impl DiagnosisCatalog {
    pub fn new(diagnoses: Vec<Diagnosis>) -> Self {
        Self { diagnoses }
    }

    /// First diagnosis whose code equals `code`.
    pub fn find(&self, code: &str) -> Option<&Diagnosis> {
        self.diagnoses.iter().find(|diagnosis| diagnosis.code == code)
    }

    /// Display name for `code`, if the catalog knows it.
    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.find(code).map(|diagnosis| diagnosis.name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnosis> {
        self.diagnoses.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnoses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }
}

impl FromIterator<Diagnosis> for DiagnosisCatalog {
    fn from_iter<I: IntoIterator<Item = Diagnosis>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Outcome of a health check, carried on the wire as an integer in `0..=3`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64", into = "u8")]
pub enum HealthCheckRating {
    Healthy = 0,
    LowRisk = 1,
    HighRisk = 2,
    CriticalRisk = 3,
}

impl HealthCheckRating {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            HealthCheckRating::Healthy => "Healthy",
            HealthCheckRating::LowRisk => "Low risk",
            HealthCheckRating::HighRisk => "High risk",
            HealthCheckRating::CriticalRisk => "Critical risk",
        }
    }
}

impl TryFrom<i64> for HealthCheckRating {
    type Error = ModelError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HealthCheckRating::Healthy),
            1 => Ok(HealthCheckRating::LowRisk),
            2 => Ok(HealthCheckRating::HighRisk),
            3 => Ok(HealthCheckRating::CriticalRisk),
            other => Err(ModelError::RatingOutOfRange(other)),
        }
    }
}

impl From<HealthCheckRating> for u8 {
    fn from(rating: HealthCheckRating) -> Self {
        rating.value()
    }
}

/// Discharge details of a hospital stay.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Discharge {
    pub date: String,
    pub criteria: String,
}

/// Sick leave granted during an occupational healthcare visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SickLeave {
    pub start_date: String,
    pub end_date: String,
}

/// Fields shared by every entry variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BaseEntry {
    /// Assigned by the patient service, never generated locally.
    pub id: String,
    pub description: String,
    pub date: String,
    pub specialist: String,
    /// May reference codes the current catalog does not know.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_codes: Option<Vec<String>>,
}

/// Variant-specific part of an entry, discriminated by the `type` field.
///
/// On its own this type is strict: an unrecognised tag or a malformed
/// payload is an error. [`Entry`] relaxes that into [`EntryDetails::Unknown`]
/// so that one unexpected record cannot fail a whole patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EntryDetails {
    #[serde(rename_all = "camelCase")]
    HealthCheck {
        health_check_rating: HealthCheckRating,
    },
    Hospital {
        discharge: Discharge,
    },
    #[serde(rename_all = "camelCase")]
    OccupationalHealthcare {
        employer_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sick_leave: Option<SickLeave>,
    },
    /// A stored record whose details could not be read. `tag` is the `type`
    /// value as received, `None` when it was missing.
    #[serde(skip)]
    Unknown { tag: Option<String> },
}

impl EntryDetails {
    /// The tag of a recognised variant.
    pub fn kind(&self) -> Option<EntryKind> {
        match self {
            EntryDetails::HealthCheck { .. } => Some(EntryKind::HealthCheck),
            EntryDetails::Hospital { .. } => Some(EntryKind::Hospital),
            EntryDetails::OccupationalHealthcare { .. } => Some(EntryKind::OccupationalHealthcare),
            EntryDetails::Unknown { .. } => None,
        }
    }
}

/// One record of a patient's medical history.
///
/// Only the base fields are required. Details that do not match a known
/// variant decode as [`EntryDetails::Unknown`] and keep their `type` tag on
/// the way back out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub base: BaseEntry,
    pub details: EntryDetails,
}

impl Entry {
    pub fn id(&self) -> &str {
        &self.base.id
    }

    pub fn kind(&self) -> Option<EntryKind> {
        self.details.kind()
    }

    pub fn diagnosis_codes(&self) -> &[String] {
        self.base.diagnosis_codes.as_deref().unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let base = BaseEntry::deserialize(&value).map_err(de::Error::custom)?;
        let details = match EntryDetails::deserialize(&value) {
            Ok(details) => details,
            Err(err) => {
                let tag = value.get("type").and_then(Value::as_str).map(str::to_string);
                tracing::debug!(
                    entry_id = %base.id,
                    ?tag,
                    error = %err,
                    "entry details not recognised"
                );
                EntryDetails::Unknown { tag }
            }
        };
        Ok(Entry { base, details })
    }
}

#[derive(Serialize)]
struct KnownEntryRef<'a> {
    #[serde(flatten)]
    base: &'a BaseEntry,
    #[serde(flatten)]
    details: &'a EntryDetails,
}

#[derive(Serialize)]
struct UnknownEntryRef<'a> {
    #[serde(flatten)]
    base: &'a BaseEntry,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    tag: Option<&'a str>,
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.details {
            EntryDetails::Unknown { tag } => UnknownEntryRef {
                base: &self.base,
                tag: tag.as_deref(),
            }
            .serialize(serializer),
            details => KnownEntryRef {
                base: &self.base,
                details,
            }
            .serialize(serializer),
        }
    }
}

/// Tag of a known entry variant.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryKind {
    #[default]
    HealthCheck,
    Hospital,
    OccupationalHealthcare,
}

impl EntryKind {
    pub const ALL: [EntryKind; 3] = [
        EntryKind::HealthCheck,
        EntryKind::Hospital,
        EntryKind::OccupationalHealthcare,
    ];

    /// Value of the `type` field on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::HealthCheck => "HealthCheck",
            EntryKind::Hospital => "Hospital",
            EntryKind::OccupationalHealthcare => "OccupationalHealthcare",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntryKind::HealthCheck => "Health Check",
            EntryKind::Hospital => "Hospital",
            EntryKind::OccupationalHealthcare => "Occupational Healthcare",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntryKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| ModelError::UnknownEntryKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// A patient together with the full entry history.
///
/// Summaries returned by the list endpoint omit `ssn` and `entries`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    pub occupation: String,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// Payload of the patient creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientFormValues {
    pub name: String,
    pub ssn: String,
    pub date_of_birth: String,
    pub occupation: String,
    pub gender: Gender,
}

/// Base fields of an entry that has not been stored yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryBase {
    pub description: String,
    pub date: String,
    pub specialist: String,
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
}

/// Body posted to the entry endpoint. Carries no `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewEntry {
    #[serde(flatten)]
    pub base: NewEntryBase,
    #[serde(flatten)]
    pub details: EntryDetails,
}

impl NewEntry {
    pub fn kind(&self) -> Option<EntryKind> {
        self.details.kind()
    }

    /// Attach a service-assigned identifier.
    pub fn into_entry(self, id: impl Into<String>) -> Entry {
        let NewEntryBase {
            description,
            date,
            specialist,
            diagnosis_codes,
        } = self.base;
        Entry {
            base: BaseEntry {
                id: id.into(),
                description,
                date,
                specialist,
                diagnosis_codes: (!diagnosis_codes.is_empty()).then_some(diagnosis_codes),
            },
            details: self.details,
        }
    }
}
