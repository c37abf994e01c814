//! VaxBook CLI - Main Entry Point
//!
//! Command-line client for the VaxBook vaccine booking platform. Talks to
//! the backend HTTP API and keeps the login session on disk between runs.

use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing::info;

use vaxbook_lib::{
    api::{ApiClient, NewPatient, NewVaccine},
    auth::AuthManager,
    commands, logging,
    storage::SessionStore,
    AppState,
};

const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser)]
#[command(
    name = "vaxbook",
    version,
    about = "CLI client for the VaxBook vaccine booking API",
    long_about = None
)]
struct Cli {
    /// Base URL of the backend API
    #[arg(long, env = "VAX_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Echo diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        username: String,

        /// Password; prompted for when omitted
        password: Option<String>,
    },
    /// Create a new account
    Signup {
        email: String,

        /// Password; prompted for when omitted
        password: Option<String>,

        /// Account role (the backend defaults to a regular user)
        #[arg(long)]
        role: Option<String>,
    },
    /// Log out and discard the stored session
    Logout,
    /// Show whether a session is active
    Status,
    /// Vaccine catalog
    #[command(subcommand)]
    Vaccines(VaccineCommands),
    /// Patient registry
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Appointments
    #[command(subcommand)]
    Appointments(AppointmentCommands),
}

#[derive(Subcommand)]
enum VaccineCommands {
    /// List the vaccine catalog
    List,
    /// Add a vaccine to the catalog (admin only)
    Add {
        name: String,
        manufacturer: String,

        #[arg(long, default_value_t = 1)]
        doses_required: u32,

        #[arg(long, default_value = "refrigerated")]
        storage_requirements: String,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// Register a patient
    Register {
        email: String,
        name: String,

        #[arg(long)]
        age: u32,
    },
}

#[derive(Subcommand)]
enum AppointmentCommands {
    /// Book an appointment
    Book {
        #[arg(long)]
        patient_id: i64,

        #[arg(long)]
        vaccine_id: i64,

        /// Appointment date, e.g. 2026-08-07T10:30
        #[arg(long)]
        date: String,
    },
    /// List all appointments
    List,
    /// Record the outcome of an appointment (admin only)
    Vaccinate {
        appointment_id: i64,

        #[arg(long, default_value = "completed")]
        status: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose);
    info!("VaxBook CLI starting...");

    let app_state = AppState {
        auth: Mutex::new(AuthManager::new()),
        storage: SessionStore::new(),
        api: ApiClient::new(&cli.api_url),
    };

    commands::restore_session(&app_state);

    match cli.command {
        Commands::Login { username, password } => {
            let password = read_password(password)?;
            commands::login(&app_state, &username, &password).await
        }
        Commands::Signup {
            email,
            password,
            role,
        } => {
            let password = read_password(password)?;
            commands::signup(&app_state, &email, &password, role.as_deref()).await
        }
        Commands::Logout => commands::logout(&app_state),
        Commands::Status => commands::status(&app_state),
        Commands::Vaccines(VaccineCommands::List) => commands::list_vaccines(&app_state).await,
        Commands::Vaccines(VaccineCommands::Add {
            name,
            manufacturer,
            doses_required,
            storage_requirements,
        }) => {
            let vaccine = NewVaccine {
                name,
                manufacturer,
                doses_required,
                storage_requirements,
            };
            commands::add_vaccine(&app_state, vaccine).await
        }
        Commands::Patients(PatientCommands::Register { email, name, age }) => {
            commands::register_patient(&app_state, NewPatient { email, name, age }).await
        }
        Commands::Appointments(AppointmentCommands::Book {
            patient_id,
            vaccine_id,
            date,
        }) => commands::book_appointment(&app_state, patient_id, vaccine_id, &date).await,
        Commands::Appointments(AppointmentCommands::List) => {
            commands::list_appointments(&app_state).await
        }
        Commands::Appointments(AppointmentCommands::Vaccinate {
            appointment_id,
            status,
        }) => commands::record_vaccination(&app_state, appointment_id, &status).await,
    }
}

fn read_password(provided: Option<String>) -> anyhow::Result<String> {
    match provided {
        Some(password) => Ok(password),
        None => Ok(inquire::Password::new("Password:")
            .without_confirmation()
            .prompt()?),
    }
}
