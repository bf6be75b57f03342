use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use patientor_core::{
    Diagnosis, DiagnosisCatalog, EntryDetails, EntryKind, Gender, NewEntry, NewEntryBase,
    Patient, PatientFormValues, PatientService, ServiceError, GENERIC_FAILURE_MESSAGE,
};
use patientor_http::{ClientConfig, HttpPatientService};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Backend {
    patients: Arc<Mutex<HashMap<String, Patient>>>,
    next_id: Arc<Mutex<u32>>,
}

impl Backend {
    fn allocate_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{prefix}-{next}")
    }
}

async fn list_patients(State(backend): State<Backend>) -> Json<Vec<Patient>> {
    let patients = backend.patients.lock().unwrap();
    let mut summaries: Vec<Patient> = patients
        .values()
        .map(|patient| Patient {
            ssn: None,
            entries: Vec::new(),
            ..patient.clone()
        })
        .collect();
    summaries.sort_by(|a, b| a.id.cmp(&b.id));
    Json(summaries)
}

async fn get_patient(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    match backend.patients.lock().unwrap().get(&id) {
        Some(patient) => Json(patient.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "unknown patient" })))
            .into_response(),
    }
}

async fn create_patient(
    State(backend): State<Backend>,
    Json(values): Json<PatientFormValues>,
) -> Json<Patient> {
    let patient = Patient {
        id: backend.allocate_id("p"),
        name: values.name,
        ssn: Some(values.ssn),
        occupation: values.occupation,
        gender: values.gender,
        date_of_birth: Some(values.date_of_birth),
        entries: Vec::new(),
    };
    backend
        .patients
        .lock()
        .unwrap()
        .insert(patient.id.clone(), patient.clone());
    Json(patient)
}

async fn add_entry(
    State(backend): State<Backend>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if body.get("id").is_some() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "id is assigned by the server" })))
            .into_response();
    }
    let date_ok = body
        .get("date")
        .and_then(Value::as_str)
        .is_some_and(|date| date.len() == 10 && date.starts_with("20"));
    if !date_ok {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "date is invalid" })))
            .into_response();
    }
    if body.get("specialist").and_then(Value::as_str) == Some("crash") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.").into_response();
    }

    let new_entry: NewEntry = match serde_json::from_value(body) {
        Ok(entry) => entry,
        Err(err) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "message": err.to_string() })))
                .into_response()
        }
    };
    let entry = new_entry.into_entry(backend.allocate_id("e"));

    let mut patients = backend.patients.lock().unwrap();
    match patients.get_mut(&id) {
        Some(patient) => {
            patient.entries.push(entry.clone());
            (StatusCode::CREATED, Json(entry)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn diagnoses() -> Json<Value> {
    Json(json!([
        { "code": "M24.2", "name": "Disorder of ligament", "latin": "Morbositas ligamenti" },
        { "code": "S62.5", "name": "Fracture of thumb" }
    ]))
}

async fn spawn_backend(backend: Backend) -> HttpPatientService {
    let app = Router::new()
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patients/:id", get(get_patient))
        .route("/api/patients/:id/entries", post(add_entry))
        .route("/api/diagnoses", get(diagnoses))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig::default().with_api_base_url(format!("http://{addr}/api"));
    HttpPatientService::new(&config).unwrap()
}

fn seeded_backend() -> Backend {
    let backend = Backend::default();
    let patient: Patient = serde_json::from_value(json!({
        "id": "d2773598",
        "name": "Matti Luukkainen",
        "dateOfBirth": "1971-04-09",
        "ssn": "090471-8890",
        "gender": "male",
        "occupation": "Digital evangelist",
        "entries": [
            {
                "id": "54a8746e",
                "date": "2019-05-01",
                "specialist": "Dr Byte House",
                "type": "HealthCheck",
                "description": "Digital overdose, very bytestatic. Otherwise healthy.",
                "healthCheckRating": 0
            },
            {
                "id": "legacy-1",
                "date": "2018-03-03",
                "specialist": "Dr Old",
                "type": "Dental",
                "description": "Imported from a legacy system"
            }
        ]
    }))
    .unwrap();
    backend
        .patients
        .lock()
        .unwrap()
        .insert(patient.id.clone(), patient);
    backend
}

fn hospital_entry(date: &str, specialist: &str) -> NewEntry {
    NewEntry {
        base: NewEntryBase {
            description: "Sprained ankle".into(),
            date: date.into(),
            specialist: specialist.into(),
            diagnosis_codes: vec!["M24.2".into()],
        },
        details: EntryDetails::Hospital {
            discharge: patientor_core::Discharge {
                date: "2024-01-01".into(),
                criteria: "recovered".into(),
            },
        },
    }
}

#[tokio::test]
async fn fetches_patient_with_mixed_entries() {
    let service = spawn_backend(seeded_backend()).await;

    let patient = service.get_by_id("d2773598").await.unwrap();

    assert_eq!(patient.name, "Matti Luukkainen");
    assert_eq!(patient.entries.len(), 2);
    assert_eq!(patient.entries[0].kind(), Some(EntryKind::HealthCheck));
    assert_eq!(
        patient.entries[1].details,
        EntryDetails::Unknown {
            tag: Some("Dental".into())
        }
    );
}

#[tokio::test]
async fn unknown_patient_is_not_found() {
    let service = spawn_backend(seeded_backend()).await;

    let err = service.get_by_id("missing").await.unwrap_err();

    assert_eq!(
        err,
        ServiceError::NotFound {
            resource: "/api/patients/missing".into()
        }
    );
}

#[tokio::test]
async fn added_entry_comes_back_with_server_id() {
    let service = spawn_backend(seeded_backend()).await;

    let created = service
        .add_entry("d2773598", &hospital_entry("2024-01-01", "Dr. Ruth"))
        .await
        .unwrap();
    assert!(created.id().starts_with("e-"));
    assert_eq!(created.kind(), Some(EntryKind::Hospital));

    let patient = service.get_by_id("d2773598").await.unwrap();
    assert_eq!(patient.entries.last(), Some(&created));
}

#[tokio::test]
async fn rejection_carries_server_message() {
    let service = spawn_backend(seeded_backend()).await;

    let err = service
        .add_entry("d2773598", &hospital_entry("not-a-date", "Dr. Ruth"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ServiceError::Rejected {
            status: 400,
            message: Some("date is invalid".into())
        }
    );
    assert_eq!(err.user_message(), "date is invalid");
}

#[tokio::test]
async fn plain_text_failure_uses_generic_message() {
    let service = spawn_backend(seeded_backend()).await;

    let err = service
        .add_entry("d2773598", &hospital_entry("2024-01-01", "crash"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn creates_and_lists_patients() {
    let service = spawn_backend(Backend::default()).await;

    let created = service
        .create(&PatientFormValues {
            name: "Hans Gruber".into(),
            ssn: "250470-555L".into(),
            date_of_birth: "1970-04-25".into(),
            occupation: "Technician".into(),
            gender: Gender::Other,
        })
        .await
        .unwrap();

    let all = service.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, created.id);
    assert_eq!(all[0].ssn, None);
}

#[tokio::test]
async fn loads_diagnosis_catalog() {
    let service = spawn_backend(Backend::default()).await;

    let catalog = service.get_diagnoses().await.unwrap();

    assert_eq!(
        catalog,
        DiagnosisCatalog::new(vec![
            Diagnosis {
                latin: Some("Morbositas ligamenti".into()),
                ..Diagnosis::new("M24.2", "Disorder of ligament")
            },
            Diagnosis::new("S62.5", "Fracture of thumb"),
        ])
    );
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default().with_api_base_url(format!("http://{addr}/api"));
    let service = HttpPatientService::new(&config).unwrap();

    let err = service.get_by_id("d2773598").await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}
