//! Patient detail page state: fetch on mount, render, add entries, refresh.

use std::sync::Arc;

use patientor_core::{
    render_patient, DiagnosisCatalog, Entry, EntryFormModel, Patient, PatientPage,
    PatientService, ServiceError, SubmitError,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use crate::alert::{Alert, AlertSlot};
use crate::config::UiConfig;

/// What the page can show for its patient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientView {
    /// Not mounted on any patient yet.
    Idle,
    Loading,
    Ready(Patient),
    /// The fetch failed; nothing is known about the patient.
    Unavailable(ServiceError),
}

/// Result of applying one completion from the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    PatientLoaded { patient_id: String },
    FetchFailed { patient_id: String, error: ServiceError },
    /// A response for a superseded fetch arrived and was dropped.
    StaleDiscarded { patient_id: String },
    AlertExpired,
    /// A timer fired for an alert that was already replaced or dismissed.
    AlertSuperseded,
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("no patient is loaded")]
    PatientNotLoaded,
    #[error("the entry form is not open")]
    FormClosed,
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[derive(Debug)]
pub(crate) enum Event {
    Fetched {
        generation: u64,
        patient_id: String,
        result: Result<Patient, ServiceError>,
    },
    AlertExpired {
        seq: u64,
    },
}

/// Owns the patient shown on the detail page.
///
/// Fetches run as tasks and post their result back to the controller, which
/// applies them one at a time in [`PatientDetailController::next_update`].
/// Each fetch is stamped with a generation; only the latest may change state.
pub struct PatientDetailController<S> {
    service: Arc<S>,
    catalog: Arc<DiagnosisCatalog>,
    config: UiConfig,
    patient_id: Option<String>,
    view: PatientView,
    generation: u64,
    awaiting: bool,
    in_flight: usize,
    mounted: bool,
    tasks: JoinSet<()>,
    events_tx: UnboundedSender<Event>,
    events_rx: UnboundedReceiver<Event>,
    entry_form: Option<EntryFormModel>,
    alert: AlertSlot,
}

impl<S> PatientDetailController<S>
where
    S: PatientService + 'static,
{
    pub fn new(service: Arc<S>, catalog: DiagnosisCatalog, config: UiConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            service,
            catalog: Arc::new(catalog),
            config,
            patient_id: None,
            view: PatientView::Idle,
            generation: 0,
            awaiting: false,
            in_flight: 0,
            mounted: false,
            tasks: JoinSet::new(),
            events_tx,
            events_rx,
            entry_form: None,
            alert: AlertSlot::default(),
        }
    }

    pub fn patient_id(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn view(&self) -> &PatientView {
        &self.view
    }

    pub fn patient(&self) -> Option<&Patient> {
        match &self.view {
            PatientView::Ready(patient) => Some(patient),
            _ => None,
        }
    }

    pub fn catalog(&self) -> &DiagnosisCatalog {
        &self.catalog
    }

    /// Rendered page, available only once the fetch has resolved.
    pub fn page(&self) -> Option<PatientPage> {
        self.patient()
            .map(|patient| render_patient(patient, &self.catalog))
    }

    pub fn alert(&self) -> Option<&Alert> {
        self.alert.current()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert.dismiss();
    }

    /// True while the authoritative fetch has not resolved.
    pub fn is_loading(&self) -> bool {
        self.awaiting
    }

    /// Start showing `patient_id`.
    pub fn mount(&mut self, patient_id: impl Into<String>) {
        self.set_patient_id(patient_id);
    }

    /// Switch to another patient. Re-selecting the current one does nothing.
    pub fn set_patient_id(&mut self, patient_id: impl Into<String>) {
        let patient_id = patient_id.into();
        if self.mounted && self.patient_id.as_deref() == Some(patient_id.as_str()) {
            return;
        }

        self.mounted = true;
        self.patient_id = Some(patient_id);
        self.view = PatientView::Loading;
        self.entry_form = None;
        self.alert.dismiss();
        self.issue_fetch();
    }

    /// Fetch the current patient again; the result replaces the shown one.
    pub fn refresh(&mut self) {
        if self.mounted {
            self.issue_fetch();
        }
    }

    /// Tear the page down. Pending fetches and timers are cancelled.
    ///
    /// The event channel is replaced, so completions already queued (or sent
    /// by a task racing its abort) never reach a later mount.
    pub fn unmount(&mut self) {
        tracing::debug!(patient_id = ?self.patient_id, "unmounting patient page");
        self.mounted = false;
        self.tasks.abort_all();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        self.events_tx = events_tx;
        self.events_rx = events_rx;
        self.in_flight = 0;
        self.awaiting = false;
        self.entry_form = None;
        self.alert.dismiss();
    }

    fn issue_fetch(&mut self) {
        let Some(patient_id) = self.patient_id.clone() else {
            return;
        };

        self.generation += 1;
        self.awaiting = true;
        self.in_flight += 1;

        let generation = self.generation;
        let service = Arc::clone(&self.service);
        let events = self.events_tx.clone();
        tracing::debug!(%patient_id, generation, "fetching patient");

        self.tasks.spawn(async move {
            let result = service.get_by_id(&patient_id).await;
            let _ = events.send(Event::Fetched {
                generation,
                patient_id,
                result,
            });
        });
    }

    /// Wait for the next completion and apply it.
    ///
    /// Returns `None` when nothing is outstanding.
    pub async fn next_update(&mut self) -> Option<Update> {
        if self.in_flight == 0 && !self.alert.is_pending() {
            return None;
        }
        let event = self.events_rx.recv().await?;
        while self.tasks.try_join_next().is_some() {}
        Some(self.apply(event))
    }

    /// Drive the loop until the latest fetch has been applied.
    pub async fn settle(&mut self) {
        while self.awaiting {
            if self.next_update().await.is_none() {
                break;
            }
        }
    }

    fn apply(&mut self, event: Event) -> Update {
        match event {
            Event::Fetched {
                generation,
                patient_id,
                result,
            } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let current = self.mounted
                    && generation == self.generation
                    && self.patient_id.as_deref() == Some(patient_id.as_str());
                if !current {
                    tracing::debug!(
                        %patient_id,
                        generation,
                        latest = self.generation,
                        "discarding stale patient response"
                    );
                    return Update::StaleDiscarded { patient_id };
                }

                self.awaiting = false;
                match result {
                    Ok(patient) => {
                        tracing::debug!(%patient_id, entries = patient.entries.len(), "patient loaded");
                        self.view = PatientView::Ready(patient);
                        Update::PatientLoaded { patient_id }
                    }
                    Err(error) => {
                        tracing::warn!(%patient_id, %error, "failed to fetch patient");
                        if !matches!(self.view, PatientView::Ready(_)) {
                            self.view = PatientView::Unavailable(error.clone());
                        }
                        Update::FetchFailed { patient_id, error }
                    }
                }
            }
            Event::AlertExpired { seq } => {
                if self.alert.expire(seq) {
                    Update::AlertExpired
                } else {
                    Update::AlertSuperseded
                }
            }
        }
    }

    /// Open the entry form for the loaded patient, or return the open one.
    pub fn open_entry_form(&mut self) -> Result<&mut EntryFormModel, FlowError> {
        let patient_id = match &self.view {
            PatientView::Ready(patient) => patient.id.clone(),
            _ => return Err(FlowError::PatientNotLoaded),
        };
        let catalog = Arc::clone(&self.catalog);
        Ok(self
            .entry_form
            .get_or_insert_with(|| EntryFormModel::new(patient_id, catalog)))
    }

    pub fn entry_form(&self) -> Option<&EntryFormModel> {
        self.entry_form.as_ref()
    }

    pub fn entry_form_mut(&mut self) -> Option<&mut EntryFormModel> {
        self.entry_form.as_mut()
    }

    pub fn cancel_entry_form(&mut self) {
        self.entry_form = None;
        self.alert.dismiss();
    }

    /// Submit the open form.
    ///
    /// On success the form closes and the patient is fetched again; the new
    /// entry appears once that fetch is applied. On failure the form stays
    /// open with its draft and an alert is raised.
    pub async fn submit_entry(&mut self) -> Result<Entry, FlowError> {
        let service = Arc::clone(&self.service);
        let Some(form) = self.entry_form.as_mut() else {
            return Err(FlowError::FormClosed);
        };

        match form.submit(service.as_ref()).await {
            Ok(entry) => {
                self.entry_form = None;
                self.alert.dismiss();
                self.refresh();
                Ok(entry)
            }
            Err(err) => {
                let alert = Alert::from_submit_error(&err);
                self.alert
                    .raise(alert, self.config.alert_timeout(), self.events_tx.clone());
                Err(err.into())
            }
        }
    }
}

/// Fetch the diagnosis catalog, falling back to an empty one on failure.
pub async fn load_catalog<S: PatientService>(service: &S) -> DiagnosisCatalog {
    match service.get_diagnoses().await {
        Ok(catalog) => catalog,
        Err(error) => {
            tracing::warn!(%error, "failed to load diagnoses, continuing without names");
            DiagnosisCatalog::default()
        }
    }
}
