//! Framework-neutral bridge between the entry model and JavaScript.

use patientor_core::{
    render_entry as render, DiagnosisCatalog, Entry, EntryDraft, FieldIssue, NewEntry,
    RenderedEntry,
};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// A rendered entry plus its plain-text form.
#[derive(Debug, Serialize)]
struct RenderedView {
    #[serde(flatten)]
    entry: RenderedEntry,
    heading: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct IssueView {
    field: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum DraftCheck {
    Valid { payload: NewEntry },
    Invalid { issues: Vec<IssueView> },
}

impl From<&FieldIssue> for IssueView {
    fn from(issue: &FieldIssue) -> Self {
        Self {
            field: issue.field.path(),
            message: issue.to_string(),
        }
    }
}

fn render_view(entry: &Entry, catalog: &DiagnosisCatalog) -> RenderedView {
    let entry = render(entry, catalog);
    RenderedView {
        heading: entry.heading(),
        text: entry.to_string(),
        entry,
    }
}

fn check(draft: &EntryDraft) -> DraftCheck {
    match draft.validate() {
        Ok(payload) => DraftCheck::Valid { payload },
        Err(errors) => DraftCheck::Invalid {
            issues: errors.issues().iter().map(IssueView::from).collect(),
        },
    }
}

#[wasm_bindgen(js_name = renderEntry)]
pub fn render_entry(entry: JsValue, catalog: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let entry: Entry = from_value(entry)
        .map_err(|err| JsValue::from_str(&format!("could not read entry: {err}")))?;
    let catalog = match catalog {
        Some(js_catalog) => from_value::<DiagnosisCatalog>(js_catalog)
            .map_err(|err| JsValue::from_str(&format!("could not read diagnoses: {err}")))?,
        None => DiagnosisCatalog::default(),
    };

    to_value(&render_view(&entry, &catalog))
        .map_err(|err| JsValue::from_str(&format!("could not serialize entry: {err}")))
}

/// Validate a form draft; resolves to the payload to post or the issues.
#[wasm_bindgen(js_name = checkDraft)]
pub fn check_draft(draft: JsValue) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let draft: EntryDraft = from_value(draft)
        .map_err(|err| JsValue::from_str(&format!("could not read draft: {err}")))?;

    to_value(&check(&draft))
        .map_err(|err| JsValue::from_str(&format!("could not serialize result: {err}")))
}
