use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triage_core::constants::DEFAULT_DATA_DIR;
use triage_core::{
    resolve_roster_dir, Clinician, CoreConfig, FileGateway, HealthCardNumber, PatientSummary,
    Prescription, TriageRegistry, VisitState, VitalSignsReading,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Emergency-room triage registry CLI")]
struct Cli {
    /// Username from the user roster
    #[arg(long)]
    username: String,
    /// Password for the user
    #[arg(long)]
    password: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new patient and sign them in
    Admit {
        /// Health card number (6 digits)
        health_card: String,
        /// Full name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: String,
    },
    /// Sign in a registered patient
    SignIn {
        /// Health card number (6 digits)
        health_card: String,
    },
    /// Record vital signs for a patient's open visit
    Vitals {
        /// Health card number (6 digits)
        health_card: String,
        #[arg(long)]
        systolic: i32,
        #[arg(long)]
        diastolic: i32,
        /// Temperature in degrees Celsius
        #[arg(long)]
        temperature: f64,
        /// Heart rate in beats per minute
        #[arg(long)]
        heart_rate: f64,
    },
    /// Record a prescription for a patient's open visit
    Prescribe {
        /// Health card number (6 digits)
        health_card: String,
        #[arg(long)]
        medication: String,
        #[arg(long)]
        instructions: String,
    },
    /// Refer a waiting patient to a physician
    Refer {
        /// Health card number (6 digits)
        health_card: String,
    },
    /// Close a patient's open visit
    Close {
        /// Health card number (6 digits)
        health_card: String,
    },
    /// Show a patient and their current visit
    Lookup {
        /// Health card number (6 digits)
        health_card: String,
    },
    /// Show the urgency and referred worklists
    Worklist,
    /// Show a patient's medical record of closed visits
    Record {
        /// Health card number (6 digits)
        health_card: String,
    },
}

/// Main entry point for the triage CLI.
///
/// # Environment Variables
/// - `TRIAGE_DATA_DIR`: directory holding `triage.yaml` (default: `triage_data`)
/// - `TRIAGE_ROSTER_DIR`: directory holding the seed rosters (default: search for `rosters/`)
/// - `RUST_LOG`: extra tracing directives
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let data_dir = std::env::var("TRIAGE_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let roster_override = std::env::var("TRIAGE_ROSTER_DIR").ok().map(PathBuf::from);
    let cfg = CoreConfig::new(PathBuf::from(data_dir), resolve_roster_dir(roster_override)?)?;

    let gateway = FileGateway::open(&cfg)
        .with_context(|| format!("failed to open store in {}", cfg.data_dir().display()))?;
    let mut registry = TriageRegistry::start(gateway, &cfg)?;

    let Some(clinician) = registry.authenticate(&cli.username, &cli.password)? else {
        anyhow::bail!("invalid username or password");
    };
    tracing::info!("{} signed in as {}", clinician.username(), clinician.role());

    run(&clinician, &mut registry, cli.command)
}

fn parse_card(input: &str) -> anyhow::Result<HealthCardNumber> {
    Ok(HealthCardNumber::parse(input)?)
}

fn run(
    clinician: &Clinician,
    registry: &mut TriageRegistry<FileGateway>,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Admit {
            health_card,
            name,
            date_of_birth,
        } => {
            let visit = clinician.admit_patient(registry, &name, &date_of_birth, &health_card)?;
            println!("Admitted {name} ({health_card}), visit {visit}");
        }
        Commands::SignIn { health_card } => {
            let card = parse_card(&health_card)?;
            let visit = clinician.sign_in_patient(registry, &card)?;
            println!("Signed in {card}, visit {visit}");
        }
        Commands::Vitals {
            health_card,
            systolic,
            diastolic,
            temperature,
            heart_rate,
        } => {
            let card = parse_card(&health_card)?;
            let reading = VitalSignsReading::create(systolic, diastolic, temperature, heart_rate)?;
            let urgency = clinician.add_vitals(registry, &card, reading)?;
            println!("Recorded vitals for {card}; urgency is now {urgency}");
        }
        Commands::Prescribe {
            health_card,
            medication,
            instructions,
        } => {
            let card = parse_card(&health_card)?;
            let prescription = Prescription::create(medication, instructions)?;
            clinician.add_prescription(registry, &card, prescription)?;
            println!("Recorded prescription for {card}");
        }
        Commands::Refer { health_card } => {
            let card = parse_card(&health_card)?;
            clinician.refer_to_physician(registry, &card)?;
            println!("Referred {card} to a physician");
        }
        Commands::Close { health_card } => {
            let card = parse_card(&health_card)?;
            clinician.close_case(registry, &card)?;
            println!("Closed case for {card}");
        }
        Commands::Lookup { health_card } => {
            let card = parse_card(&health_card)?;
            match clinician.patient_summary(registry, &card)? {
                None => println!("No patient with health card {card}."),
                Some(summary) => {
                    print_summary(&summary);
                    if let Some(visit) = clinician.visit_snapshot(registry, &card)? {
                        println!("{}", visit.display_text);
                    }
                }
            }
        }
        Commands::Worklist => {
            let (waiting, referred) = clinician.worklists(registry)?;
            println!("Waiting ({}):", waiting.len());
            for summary in &waiting {
                print_summary(summary);
            }
            println!("Referred to physician ({}):", referred.len());
            for summary in &referred {
                print_summary(summary);
            }
        }
        Commands::Record { health_card } => {
            let card = parse_card(&health_card)?;
            println!("{}", clinician.medical_record_text(registry, &card)?);
        }
    }

    Ok(())
}

fn print_summary(summary: &PatientSummary) {
    let status = match summary.visit_state {
        None => "not admitted",
        Some(VisitState::OpenUnseen) => "waiting",
        Some(VisitState::OpenSeen) => "seen by doctor",
        Some(VisitState::Closed) => "closed",
    };
    let arrived = summary
        .arrival_time
        .map(|t| t.with_timezone(&Local).format(", arrived %m/%d/%Y %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "  {} {} (born {}, age {}) urgency {} [{status}{arrived}]",
        summary.health_card, summary.name, summary.date_of_birth, summary.age, summary.urgency
    );
}
