//! Patient detail page logic, independent of any rendering toolkit.
//!
//! The controller runs on a tokio runtime: network calls are spawned tasks
//! whose completions are applied in order by the page owner.

mod alert;
mod config;
mod controller;

pub use alert::{Alert, AlertKind};
pub use config::UiConfig;
pub use controller::{load_catalog, FlowError, PatientDetailController, PatientView, Update};
