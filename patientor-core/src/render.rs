//! Pure rendering of entries and patients into display descriptions.

use std::fmt;

use serde::Serialize;

use crate::model::{
    Diagnosis, DiagnosisCatalog, Discharge, Entry, EntryDetails, Gender, HealthCheckRating,
    Patient, SickLeave,
};

/// Label shown in place of an entry whose type is not recognised.
pub const UNKNOWN_ENTRY_LABEL: &str = "Unknown Entry Type";

/// A diagnosis code with its catalog name, when the catalog has one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderedDiagnosis {
    pub code: String,
    pub name: Option<String>,
}

/// Fields every recognised entry displays.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntrySummary {
    pub id: String,
    pub date: String,
    pub description: String,
    pub specialist: String,
    pub diagnoses: Vec<RenderedDiagnosis>,
}

/// Display description of a single entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RenderedEntry {
    HealthCheck {
        summary: EntrySummary,
        rating: HealthCheckRating,
    },
    Hospital {
        summary: EntrySummary,
        discharge: Discharge,
    },
    OccupationalHealthcare {
        summary: EntrySummary,
        employer_name: String,
        sick_leave: Option<SickLeave>,
    },
    Unknown {
        id: String,
    },
}

impl RenderedEntry {
    pub fn heading(&self) -> &'static str {
        match self {
            RenderedEntry::HealthCheck { .. } => "Health Check Entry",
            RenderedEntry::Hospital { .. } => "Hospital Entry",
            RenderedEntry::OccupationalHealthcare { .. } => "Occupational Healthcare Entry",
            RenderedEntry::Unknown { .. } => UNKNOWN_ENTRY_LABEL,
        }
    }

    pub fn summary(&self) -> Option<&EntrySummary> {
        match self {
            RenderedEntry::HealthCheck { summary, .. }
            | RenderedEntry::Hospital { summary, .. }
            | RenderedEntry::OccupationalHealthcare { summary, .. } => Some(summary),
            RenderedEntry::Unknown { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RenderedEntry::Unknown { .. })
    }
}

/// Render one entry against the diagnosis catalog. Never fails.
pub fn render_entry(entry: &Entry, catalog: &DiagnosisCatalog) -> RenderedEntry {
    let summary = || EntrySummary {
        id: entry.base.id.clone(),
        date: entry.base.date.clone(),
        description: entry.base.description.clone(),
        specialist: entry.base.specialist.clone(),
        diagnoses: resolve_diagnoses(entry.diagnosis_codes(), catalog),
    };

    match &entry.details {
        EntryDetails::HealthCheck {
            health_check_rating,
        } => RenderedEntry::HealthCheck {
            summary: summary(),
            rating: *health_check_rating,
        },
        EntryDetails::Hospital { discharge } => RenderedEntry::Hospital {
            summary: summary(),
            discharge: discharge.clone(),
        },
        EntryDetails::OccupationalHealthcare {
            employer_name,
            sick_leave,
        } => RenderedEntry::OccupationalHealthcare {
            summary: summary(),
            employer_name: employer_name.clone(),
            sick_leave: sick_leave.clone(),
        },
        EntryDetails::Unknown { tag } => {
            tracing::debug!(entry_id = %entry.base.id, ?tag, "rendering entry of unrecognised type");
            RenderedEntry::Unknown {
                id: entry.base.id.clone(),
            }
        }
    }
}

fn resolve_diagnoses(codes: &[String], catalog: &DiagnosisCatalog) -> Vec<RenderedDiagnosis> {
    codes
        .iter()
        .map(|code| RenderedDiagnosis {
            code: code.clone(),
            name: catalog
                .find(code)
                .map(|Diagnosis { name, .. }| name.clone()),
        })
        .collect()
}

impl fmt::Display for RenderedDiagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} {name}", self.code),
            None => f.write_str(&self.code),
        }
    }
}

impl fmt::Display for RenderedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(summary) = self.summary() else {
            return f.write_str(UNKNOWN_ENTRY_LABEL);
        };

        writeln!(f, "{}", summary.date)?;
        writeln!(f, "{}", self.heading())?;
        writeln!(f, "{}", summary.description)?;
        for diagnosis in &summary.diagnoses {
            writeln!(f, "  - {diagnosis}")?;
        }
        write!(f, "Specialist: {}", summary.specialist)?;

        match self {
            RenderedEntry::HealthCheck { rating, .. } => {
                write!(f, "\nHealth check rating: {}", rating.value())
            }
            RenderedEntry::Hospital { discharge, .. } => {
                write!(f, "\nDischarge date: {}", discharge.date)?;
                write!(f, "\nDischarge criteria: {}", discharge.criteria)
            }
            RenderedEntry::OccupationalHealthcare {
                employer_name,
                sick_leave,
                ..
            } => {
                write!(f, "\nEmployer: {employer_name}")?;
                if let Some(leave) = sick_leave {
                    write!(f, "\nSick leave start: {}", leave.start_date)?;
                    write!(f, "\nSick leave end: {}", leave.end_date)?;
                }
                Ok(())
            }
            RenderedEntry::Unknown { .. } => Ok(()),
        }
    }
}

/// Display description of the patient detail page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PatientPage {
    pub name: String,
    pub gender: Gender,
    pub ssn: Option<String>,
    pub occupation: String,
    pub entries: Vec<RenderedEntry>,
}

/// Render a loaded patient and each of its entries.
pub fn render_patient(patient: &Patient, catalog: &DiagnosisCatalog) -> PatientPage {
    PatientPage {
        name: patient.name.clone(),
        gender: patient.gender,
        ssn: patient.ssn.clone(),
        occupation: patient.occupation.clone(),
        entries: patient
            .entries
            .iter()
            .map(|entry| render_entry(entry, catalog))
            .collect(),
    }
}

impl fmt::Display for PatientPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.gender.label())?;
        writeln!(f, "ssn: {}", self.ssn.as_deref().unwrap_or("-"))?;
        writeln!(f, "occupation: {}", self.occupation)?;
        writeln!(f)?;
        write!(f, "entries")?;

        if self.entries.is_empty() {
            return write!(f, "\nNo entries available");
        }
        for entry in &self.entries {
            write!(f, "\n\n{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BaseEntry, Diagnosis};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog() -> DiagnosisCatalog {
        DiagnosisCatalog::new(vec![
            Diagnosis::new("M24.2", "Disorder of ligament"),
            Diagnosis::new("S62.5", "Fracture of thumb"),
        ])
    }

    fn base(id: &str, codes: Option<Vec<&str>>) -> BaseEntry {
        BaseEntry {
            id: id.into(),
            description: "Healing time appr. 2 weeks.".into(),
            date: "2015-01-02".into(),
            specialist: "MD House".into(),
            diagnosis_codes: codes.map(|codes| codes.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn hospital_entry_text() {
        let entry = Entry {
            base: base("h1", Some(vec!["S62.5", "Z99.9"])),
            details: EntryDetails::Hospital {
                discharge: Discharge {
                    date: "2015-01-16".into(),
                    criteria: "Thumb has healed.".into(),
                },
            },
        };

        let rendered = render_entry(&entry, &catalog());
        let expected = "\
2015-01-02
Hospital Entry
Healing time appr. 2 weeks.
  - S62.5 Fracture of thumb
  - Z99.9
Specialist: MD House
Discharge date: 2015-01-16
Discharge criteria: Thumb has healed.";

        assert_eq!(rendered.to_string(), expected);
        assert!(!rendered.to_string().contains("Employer"));
    }

    #[test]
    fn codes_missing_from_catalog_keep_the_code() {
        let entry = Entry {
            base: base("o1", Some(vec!["Z57.1", "M24.2"])),
            details: EntryDetails::OccupationalHealthcare {
                employer_name: "HyPD".into(),
                sick_leave: None,
            },
        };

        let rendered = render_entry(&entry, &DiagnosisCatalog::default());
        let summary = rendered.summary().unwrap();
        assert_eq!(
            summary.diagnoses,
            vec![
                RenderedDiagnosis {
                    code: "Z57.1".into(),
                    name: None
                },
                RenderedDiagnosis {
                    code: "M24.2".into(),
                    name: None
                },
            ]
        );

        let resolved = render_entry(&entry, &catalog());
        assert_eq!(
            resolved.summary().unwrap().diagnoses[1].name.as_deref(),
            Some("Disorder of ligament")
        );
    }

    #[test]
    fn occupational_entry_shows_sick_leave_only_when_present() {
        let mut entry = Entry {
            base: base("o2", None),
            details: EntryDetails::OccupationalHealthcare {
                employer_name: "FBI".into(),
                sick_leave: Some(SickLeave {
                    start_date: "2019-08-05".into(),
                    end_date: "2019-08-28".into(),
                }),
            },
        };

        let text = render_entry(&entry, &catalog()).to_string();
        assert!(text.ends_with(
            "Employer: FBI\nSick leave start: 2019-08-05\nSick leave end: 2019-08-28"
        ));

        entry.details = EntryDetails::OccupationalHealthcare {
            employer_name: "FBI".into(),
            sick_leave: None,
        };
        let text = render_entry(&entry, &catalog()).to_string();
        assert!(text.ends_with("Employer: FBI"));
        assert!(!text.contains("Discharge"));
    }

    #[test]
    fn health_check_shows_numeric_rating() {
        let entry = Entry {
            base: base("c1", None),
            details: EntryDetails::HealthCheck {
                health_check_rating: HealthCheckRating::HighRisk,
            },
        };

        let rendered = render_entry(&entry, &catalog());
        assert_eq!(rendered.heading(), "Health Check Entry");
        assert!(rendered.to_string().ends_with("Health check rating: 2"));
    }

    #[test]
    fn unrecognised_types_render_placeholder() {
        for tag in ["Telemedicine", "", "hospital", "HEALTHCHECK"] {
            let entry: Entry = serde_json::from_value(json!({
                "id": "u1",
                "type": tag,
                "date": "2020-02-02",
                "specialist": "Dr. Who",
                "description": "?",
                "diagnosisCodes": ["M24.2"]
            }))
            .unwrap();

            let rendered = render_entry(&entry, &catalog());
            assert_eq!(rendered, RenderedEntry::Unknown { id: "u1".into() });
            assert_eq!(rendered.to_string(), UNKNOWN_ENTRY_LABEL);
        }
    }

    #[test]
    fn malformed_record_does_not_hide_the_others() {
        let patient: Patient = serde_json::from_value(json!({
            "id": "p3",
            "name": "Fox Mulder",
            "gender": "male",
            "occupation": "Agent",
            "entries": [
                {
                    "id": "known",
                    "type": "HealthCheck",
                    "date": "2019-10-20",
                    "specialist": "MD House",
                    "description": "Yearly control visit.",
                    "healthCheckRating": 1
                },
                {
                    "id": "bare",
                    "date": "2019-10-21",
                    "specialist": "MD House",
                    "description": "No type recorded"
                }
            ]
        }))
        .unwrap();

        let page = render_patient(&patient, &catalog());

        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].heading(), "Health Check Entry");
        assert_eq!(page.entries[1], RenderedEntry::Unknown { id: "bare".into() });
    }

    #[test]
    fn page_without_entries() {
        let patient = Patient {
            id: "p1".into(),
            name: "John McClane".into(),
            ssn: Some("090786-122X".into()),
            occupation: "New york city cop".into(),
            gender: Gender::Male,
            date_of_birth: None,
            entries: Vec::new(),
        };

        let page = render_patient(&patient, &catalog());
        assert_eq!(
            page.to_string(),
            "John McClane (male)\nssn: 090786-122X\noccupation: New york city cop\n\nentries\nNo entries available"
        );
    }

    #[test]
    fn page_renders_every_entry_in_order() {
        let patient = Patient {
            id: "p2".into(),
            name: "Dana Scully".into(),
            ssn: None,
            occupation: "Forensic Pathologist".into(),
            gender: Gender::Female,
            date_of_birth: Some("1974-01-05".into()),
            entries: vec![
                Entry {
                    base: base("a", None),
                    details: EntryDetails::Unknown { tag: None },
                },
                Entry {
                    base: base("b", Some(vec!["M24.2"])),
                    details: EntryDetails::HealthCheck {
                        health_check_rating: HealthCheckRating::Healthy,
                    },
                },
            ],
        };

        let page = render_patient(&patient, &catalog());
        assert_eq!(page.entries.len(), 2);
        assert!(page.entries[0].is_unknown());
        assert_eq!(page.entries[1].summary().map(|s| s.id.as_str()), Some("b"));
        assert!(page.to_string().contains("Unknown Entry Type\n\n2015-01-02"));
    }
}
