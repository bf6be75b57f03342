//! reqwest-backed patient service.

use std::time::Duration;

use patientor_core::{
    DiagnosisCatalog, Entry, NewEntry, Patient, PatientFormValues, PatientService, ServiceError,
};

use crate::config::ClientConfig;
use crate::error::HttpError;
use crate::http::check_response;

/// HTTP client for the patient API.
#[derive(Debug, Clone)]
pub struct HttpPatientService {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPatientService {
    /// Build a client from validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn patient_url(&self, id: &str) -> String {
        format!("{}/patients/{}", self.base_url, urlencoding::encode(id))
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, HttpError> {
        let url = format!("{}/patients", self.base_url);
        let resp = check_response(self.http.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn fetch_patient(&self, id: &str) -> Result<Patient, HttpError> {
        let url = self.patient_url(id);
        tracing::debug!(%url, "fetching patient");
        let resp = check_response(self.http.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn create_patient(&self, values: &PatientFormValues) -> Result<Patient, HttpError> {
        let url = format!("{}/patients", self.base_url);
        let resp = check_response(self.http.post(&url).json(values).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn post_entry(&self, patient_id: &str, entry: &NewEntry) -> Result<Entry, HttpError> {
        let url = format!("{}/entries", self.patient_url(patient_id));
        tracing::debug!(%url, kind = ?entry.kind(), "posting entry");
        let resp = check_response(self.http.post(&url).json(entry).send().await?).await?;
        Ok(resp.json().await?)
    }

    async fn fetch_diagnoses(&self) -> Result<DiagnosisCatalog, HttpError> {
        let url = format!("{}/diagnoses", self.base_url);
        let resp = check_response(self.http.get(&url).send().await?).await?;
        Ok(resp.json().await?)
    }
}

impl PatientService for HttpPatientService {
    async fn get_all(&self) -> Result<Vec<Patient>, ServiceError> {
        Ok(self.list_patients().await?)
    }

    async fn get_by_id(&self, id: &str) -> Result<Patient, ServiceError> {
        Ok(self.fetch_patient(id).await?)
    }

    async fn create(&self, values: &PatientFormValues) -> Result<Patient, ServiceError> {
        Ok(self.create_patient(values).await?)
    }

    async fn add_entry(&self, patient_id: &str, entry: &NewEntry) -> Result<Entry, ServiceError> {
        Ok(self.post_entry(patient_id, entry).await?)
    }

    async fn get_diagnoses(&self) -> Result<DiagnosisCatalog, ServiceError> {
        Ok(self.fetch_diagnoses().await?)
    }
}
