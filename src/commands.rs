//! Command Handlers Module
//!
//! One handler per CLI subcommand. Each builds a request payload, invokes
//! the API client, and maps the outcome to user-visible output.

use anyhow::bail;
use chrono::NaiveDateTime;
use tracing::{debug, error, info};

use crate::api::{ApiError, BookingRequest, NewPatient, NewVaccine, SignupRequest};
use crate::auth::Session;
use crate::AppState;

/// Storage key for the persisted session
const SESSION_KEY: &str = "session";

/// Restore a stored session into the auth manager, discarding expired ones
pub fn restore_session(state: &AppState) {
    debug!("Restoring stored session");

    match state.storage.load::<Session>(SESSION_KEY) {
        Ok(session) => {
            if session.is_expired() {
                info!("Stored session is expired");
                let _ = state.storage.delete(SESSION_KEY);
                return;
            }

            if let Ok(mut auth) = state.auth.lock() {
                auth.set_session(session);
            }
        }
        Err(_) => {
            debug!("No stored session found");
        }
    }
}

/// Log in, remember the session, and persist it for later invocations
pub async fn login(state: &AppState, username: &str, password: &str) -> anyhow::Result<()> {
    info!("Logging in as {}", username);

    match state.api.login(username, password).await {
        Ok(token) => {
            let session = Session::from_token(token.access_token, token.token_type);

            if let Ok(mut auth) = state.auth.lock() {
                auth.set_session(session.clone());
            }

            if let Err(e) = state.storage.save(SESSION_KEY, &session) {
                error!("Failed to save session: {}", e);
            }

            println!(
                "Logged in. Session valid until {}.",
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
            Ok(())
        }
        Err(e) => {
            error!("Login failed: {}", e);
            bail!("login failed: {}", describe(&e));
        }
    }
}

/// Log out and discard the stored session
pub fn logout(state: &AppState) -> anyhow::Result<()> {
    info!("Logging out");

    if let Ok(mut auth) = state.auth.lock() {
        auth.clear_session();
    }

    let _ = state.storage.delete(SESSION_KEY);

    println!("Logged out.");
    Ok(())
}

/// Show whether a session is active
pub fn status(state: &AppState) -> anyhow::Result<()> {
    let session = state
        .auth
        .lock()
        .ok()
        .and_then(|auth| auth.get_session().cloned());

    match session {
        Some(session) => println!(
            "Logged in. Session valid until {}.",
            session.expires_at.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("Not logged in."),
    }

    Ok(())
}

/// Create a new user account
pub async fn signup(
    state: &AppState,
    email: &str,
    password: &str,
    role: Option<&str>,
) -> anyhow::Result<()> {
    let request = SignupRequest {
        email,
        password,
        role,
    };

    match state.api.signup(&request).await {
        Ok(user) => {
            println!(
                "Account created for {} (role: {}). You can now log in.",
                user.email, user.role
            );
            Ok(())
        }
        Err(e) => {
            error!("Signup failed: {}", e);
            bail!("signup failed: {}", describe(&e));
        }
    }
}

/// List the vaccine catalog
pub async fn list_vaccines(state: &AppState) -> anyhow::Result<()> {
    let token = current_token(state);

    match state.api.list_vaccines(token.as_deref()).await {
        Ok(vaccines) => {
            if vaccines.is_empty() {
                println!("No vaccines in the catalog.");
                return Ok(());
            }

            for vaccine in &vaccines {
                println!(
                    "{:>4}  {} by {} ({} doses, storage: {})",
                    vaccine.id,
                    vaccine.name,
                    vaccine.manufacturer,
                    vaccine.doses_required,
                    vaccine.storage_requirements
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to list vaccines: {}", e);
            bail!("could not list vaccines: {}", describe(&e));
        }
    }
}

/// Add a vaccine to the catalog (admin only)
pub async fn add_vaccine(state: &AppState, vaccine: NewVaccine) -> anyhow::Result<()> {
    let token = require_token(state)?;

    match state.api.add_vaccine(&token, &vaccine).await {
        Ok(created) => {
            println!("Added vaccine {} ({}).", created.name, created.id);
            Ok(())
        }
        Err(e) => {
            error!("Failed to add vaccine: {}", e);
            bail!("could not add vaccine: {}", describe(&e));
        }
    }
}

/// Register a patient
pub async fn register_patient(state: &AppState, patient: NewPatient) -> anyhow::Result<()> {
    let token = require_token(state)?;

    match state.api.register_patient(&token, &patient).await {
        Ok(created) => {
            println!("Registered patient {} ({}).", created.name, created.id);
            Ok(())
        }
        Err(e) => {
            error!("Failed to register patient: {}", e);
            bail!("could not register patient: {}", describe(&e));
        }
    }
}

/// Book a vaccination appointment
pub async fn book_appointment(
    state: &AppState,
    patient_id: i64,
    vaccine_id: i64,
    date: &str,
) -> anyhow::Result<()> {
    let token = require_token(state)?;
    let appointment_date = parse_appointment_date(date)?;

    let booking = BookingRequest {
        patient_id,
        vaccine_id,
        appointment_date,
    };

    match state.api.book_appointment(&token, &booking).await {
        Ok(appointment) => {
            println!(
                "Booked appointment {} for {} ({}).",
                appointment.id, appointment.appointment_date, appointment.status
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to book appointment: {}", e);
            bail!("could not book appointment: {}", describe(&e));
        }
    }
}

/// List all appointments
pub async fn list_appointments(state: &AppState) -> anyhow::Result<()> {
    let token = require_token(state)?;

    match state.api.list_appointments(&token).await {
        Ok(appointments) => {
            if appointments.is_empty() {
                println!("No appointments.");
                return Ok(());
            }

            for appointment in &appointments {
                println!(
                    "{:>4}  patient {} / vaccine {} at {} [{}]",
                    appointment.id,
                    appointment.patient_id,
                    appointment.vaccine_id,
                    appointment.appointment_date,
                    appointment.status
                );
            }
            Ok(())
        }
        Err(e) => {
            error!("Failed to list appointments: {}", e);
            bail!("could not list appointments: {}", describe(&e));
        }
    }
}

/// Record the outcome of an appointment (admin only)
pub async fn record_vaccination(
    state: &AppState,
    appointment_id: i64,
    status: &str,
) -> anyhow::Result<()> {
    let token = require_token(state)?;

    match state.api.record_vaccination(&token, appointment_id, status).await {
        Ok(appointment) => {
            println!(
                "Appointment {} marked as {}.",
                appointment.id, appointment.status
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to record vaccination: {}", e);
            bail!("could not record vaccination: {}", describe(&e));
        }
    }
}

/// Current token, if a valid session exists
fn current_token(state: &AppState) -> Option<String> {
    state
        .auth
        .lock()
        .ok()
        .and_then(|auth| auth.get_access_token().map(|s| s.to_string()))
}

/// Current token, or fail before sending a doomed request
fn require_token(state: &AppState) -> anyhow::Result<String> {
    match current_token(state) {
        Some(token) => Ok(token),
        None => bail!("not logged in; run `vaxbook login` first"),
    }
}

/// Map an API error to a message that tells the user what went wrong
fn describe(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => "could not reach the server; is it running?".to_string(),
        ApiError::Client { status: 401, .. } => {
            "not authorized; your session may have expired, log in again".to_string()
        }
        ApiError::Client { status: 403, .. } => {
            "not allowed; this action requires an admin account".to_string()
        }
        ApiError::Client { message, .. } => message.clone(),
        ApiError::Server { status, .. } => format!("the server failed with status {}", status),
        ApiError::Decode(_) => "the server returned an unexpected response".to_string(),
    }
}

/// Accepted appointment date formats
fn parse_appointment_date(raw: &str) -> anyhow::Result<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(date);
        }
    }

    bail!("invalid date '{}'; expected e.g. 2026-08-07T10:30", raw);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::AuthManager;
    use crate::storage::SessionStore;
    use std::sync::Mutex;

    fn state_at(dir: &std::path::Path) -> AppState {
        AppState {
            auth: Mutex::new(AuthManager::new()),
            storage: SessionStore::at(dir),
            api: ApiClient::new("http://localhost:8000"),
        }
    }

    #[test]
    fn parse_appointment_date_accepts_common_formats() {
        for raw in ["2026-08-07T10:30:00", "2026-08-07T10:30", "2026-08-07 10:30"] {
            let date = parse_appointment_date(raw).unwrap();
            assert_eq!(date.format("%Y-%m-%d %H:%M").to_string(), "2026-08-07 10:30");
        }
    }

    #[test]
    fn parse_appointment_date_rejects_garbage() {
        assert!(parse_appointment_date("next tuesday").is_err());
        assert!(parse_appointment_date("2026-08-07").is_err());
    }

    #[test]
    fn require_token_fails_when_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path());

        let err = require_token(&state).unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }

    #[test]
    fn restore_session_loads_valid_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path());

        let session = Session::from_token("abc".to_string(), "bearer".to_string());
        state.storage.save(SESSION_KEY, &session).unwrap();

        restore_session(&state);
        assert_eq!(current_token(&state).as_deref(), Some("abc"));
    }

    #[test]
    fn restore_session_discards_expired_session() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_at(dir.path());

        let session = Session {
            access_token: "stale".to_string(),
            token_type: "bearer".to_string(),
            expires_at: chrono::Utc::now() - chrono::Duration::minutes(1),
        };
        state.storage.save(SESSION_KEY, &session).unwrap();

        restore_session(&state);
        assert!(current_token(&state).is_none());
        assert!(!state.storage.exists(SESSION_KEY));
    }

    #[test]
    fn describe_distinguishes_error_kinds() {
        let network = describe(&ApiError::Network("connection refused".into()));
        assert!(network.contains("reach the server"));

        let bad_credentials = describe(&ApiError::Client {
            status: 400,
            message: "Incorrect username or password".into(),
        });
        assert_eq!(bad_credentials, "Incorrect username or password");

        let forbidden = describe(&ApiError::Client {
            status: 403,
            message: "Not authorized".into(),
        });
        assert!(forbidden.contains("admin"));

        let server = describe(&ApiError::Server {
            status: 502,
            message: "Bad Gateway".into(),
        });
        assert!(server.contains("502"));
    }
}
