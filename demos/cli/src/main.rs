use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use patientor_core::{EntryKind, PatientService};
use patientor_http::{ClientConfig, HttpPatientService};
use patientor_ui::{load_catalog, PatientDetailController, PatientView, UiConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "patientor-cli", about = "Browse patients and record medical entries.")]
struct Args {
    /// Base URL of the patient API; overrides PATIENTOR_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log more (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all patients.
    List,
    /// Show one patient with their entries.
    Show { id: String },
    /// Add an entry to a patient and show the refreshed record.
    AddEntry(AddEntry),
}

#[derive(ClapArgs, Debug)]
struct AddEntry {
    id: String,
    /// HealthCheck, Hospital or OccupationalHealthcare.
    #[arg(long = "type", default_value_t = EntryKind::HealthCheck)]
    kind: EntryKind,
    #[arg(long)]
    description: String,
    /// YYYY-MM-DD
    #[arg(long)]
    date: String,
    #[arg(long)]
    specialist: String,
    /// Diagnosis code; repeat for several.
    #[arg(long = "diagnosis")]
    diagnoses: Vec<String>,
    #[arg(long)]
    rating: Option<i64>,
    #[arg(long)]
    discharge_date: Option<String>,
    #[arg(long)]
    discharge_criteria: Option<String>,
    #[arg(long)]
    employer: Option<String>,
    #[arg(long)]
    sick_leave_start: Option<String>,
    #[arg(long)]
    sick_leave_end: Option<String>,
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => "patientor=info",
        1 => "patientor=debug",
        _ => "patientor=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = args.api_url.clone() {
        config = config.with_api_base_url(url);
    }
    let service = Arc::new(HttpPatientService::new(&config)?);
    tracing::debug!(base_url = service.base_url(), "using patient api");

    match args.command {
        Command::List => list(service.as_ref(), args.json).await,
        Command::Show { id } => show(service, &id, args.json).await,
        Command::AddEntry(entry) => add_entry(service, entry, args.json).await,
    }
}

async fn list(service: &HttpPatientService, json: bool) -> anyhow::Result<()> {
    let patients = service.get_all().await.context("could not list patients")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&patients)?);
        return Ok(());
    }
    for patient in patients {
        println!(
            "{}\t{} ({})\t{}",
            patient.id,
            patient.name,
            patient.gender.label(),
            patient.occupation
        );
    }
    Ok(())
}

async fn open_page(
    service: Arc<HttpPatientService>,
    id: &str,
) -> PatientDetailController<HttpPatientService> {
    let catalog = load_catalog(service.as_ref()).await;
    let mut page = PatientDetailController::new(service, catalog, UiConfig::default());
    page.mount(id);
    page.settle().await;
    page
}

fn print_page(page: &PatientDetailController<HttpPatientService>, json: bool) -> anyhow::Result<()> {
    match page.view() {
        PatientView::Ready(_) => {
            if let Some(rendered) = page.page() {
                if json {
                    println!("{}", serde_json::to_string_pretty(&rendered)?);
                } else {
                    println!("{rendered}");
                }
            }
            Ok(())
        }
        PatientView::Unavailable(err) => bail!("patient unavailable: {err}"),
        PatientView::Idle | PatientView::Loading => {
            println!("Loading...");
            Ok(())
        }
    }
}

async fn show(service: Arc<HttpPatientService>, id: &str, json: bool) -> anyhow::Result<()> {
    let page = open_page(service, id).await;
    print_page(&page, json)
}

async fn add_entry(
    service: Arc<HttpPatientService>,
    entry: AddEntry,
    json: bool,
) -> anyhow::Result<()> {
    let mut page = open_page(service, &entry.id).await;
    if let PatientView::Unavailable(err) = page.view() {
        bail!("patient unavailable: {err}");
    }

    let form = page.open_entry_form()?;
    form.set_kind(entry.kind);
    form.set_description(entry.description);
    form.set_date(entry.date);
    form.set_specialist(entry.specialist);
    form.set_health_check_rating(entry.rating);
    form.set_discharge_date(entry.discharge_date.unwrap_or_default());
    form.set_discharge_criteria(entry.discharge_criteria.unwrap_or_default());
    form.set_employer_name(entry.employer.unwrap_or_default());
    form.set_sick_leave_start(entry.sick_leave_start.unwrap_or_default());
    form.set_sick_leave_end(entry.sick_leave_end.unwrap_or_default());
    for code in &entry.diagnoses {
        if !form.select_diagnosis(code) {
            eprintln!("ignoring diagnosis code {code}");
        }
    }

    match page.submit_entry().await {
        Ok(created) => {
            tracing::info!(entry_id = created.id(), "entry stored");
            page.settle().await;
            print_page(&page, json)
        }
        Err(err) => {
            let message = page
                .alert()
                .map(|alert| alert.message.clone())
                .unwrap_or_else(|| err.to_string());
            bail!("{message}")
        }
    }
}
