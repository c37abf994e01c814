//! API Client Module
//!
//! Typed HTTP access to the VaxBook backend API.

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// API client for the VaxBook backend.
///
/// Holds only the base URL and the underlying HTTP client. Credentials are
/// passed explicitly per call, never stored as default headers, so a cleared
/// token cannot linger on later requests.
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and obtain an access token.
    ///
    /// The backend implements the OAuth2 password flow, so the credentials go
    /// out form-encoded rather than as JSON.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let url = format!("{}/login", self.base_url);

        debug!("Logging in at: {}", url);

        let response = self
            .client
            .post(&url)
            .form(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let token = read_json::<TokenResponse>(response).await?;

        info!("Login succeeded");
        Ok(token)
    }

    /// Register a new user account
    pub async fn signup(&self, request: &SignupRequest<'_>) -> Result<UserOut, ApiError> {
        let url = format!("{}/signup", self.base_url);

        debug!("Signing up at: {}", url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }

    /// List all vaccines.
    ///
    /// The endpoint is readable without credentials, but the token is
    /// attached when a session exists, matching how the backend treats the
    /// rest of the vaccine routes.
    pub async fn list_vaccines(&self, access_token: Option<&str>) -> Result<Vec<Vaccine>, ApiError> {
        let url = format!("{}/vaccines", self.base_url);

        let mut request = self.client.get(&url);
        if let Some(token) = access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }

    /// Add a vaccine to the catalog (admin only)
    pub async fn add_vaccine(
        &self,
        access_token: &str,
        vaccine: &NewVaccine,
    ) -> Result<Vaccine, ApiError> {
        let url = format!("{}/vaccines", self.base_url);

        info!("Adding vaccine: {} ({})", vaccine.name, vaccine.manufacturer);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(vaccine)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }

    /// Register a patient
    pub async fn register_patient(
        &self,
        access_token: &str,
        patient: &NewPatient,
    ) -> Result<Patient, ApiError> {
        let url = format!("{}/patients", self.base_url);

        info!("Registering patient: {}", patient.email);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(patient)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }

    /// Book a vaccination appointment
    pub async fn book_appointment(
        &self,
        access_token: &str,
        booking: &BookingRequest,
    ) -> Result<Appointment, ApiError> {
        let url = format!("{}/appointments", self.base_url);

        info!(
            "Booking appointment: patient {} / vaccine {}",
            booking.patient_id, booking.vaccine_id
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(booking)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let appointment = read_json::<Appointment>(response).await?;

        info!("Appointment booked: {}", appointment.id);
        Ok(appointment)
    }

    /// List all appointments
    pub async fn list_appointments(&self, access_token: &str) -> Result<Vec<Appointment>, ApiError> {
        let url = format!("{}/appointments", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }

    /// Record the outcome of an appointment (admin only)
    pub async fn record_vaccination(
        &self,
        access_token: &str,
        appointment_id: i64,
        status: &str,
    ) -> Result<Appointment, ApiError> {
        let url = format!("{}/appointments/{}/vaccinate", self.base_url, appointment_id);

        info!("Recording vaccination for appointment {}", appointment_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&VaccinationUpdate { status })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        read_json(response).await
    }
}

/// Decode a 2xx body as `T`, or map the response to the error taxonomy.
///
/// The backend reports failures as `{"detail": ...}`; when that shape is
/// missing or unreadable the status line stands in as the message.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()));
    }

    let message = response
        .json::<ErrorDetail>()
        .await
        .map(|d| d.detail)
        .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));

    if status.is_server_error() {
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(ApiError::Client {
            status: status.as_u16(),
            message,
        })
    }
}

// Request/Response types

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct UserOut {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: i64,
    pub name: String,
    pub manufacturer: String,
    pub doses_required: u32,
    pub storage_requirements: String,
}

#[derive(Debug, Serialize)]
pub struct NewVaccine {
    pub name: String,
    pub manufacturer: String,
    pub doses_required: u32,
    pub storage_requirements: String,
}

#[derive(Debug, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Serialize)]
pub struct NewPatient {
    pub email: String,
    pub name: String,
    pub age: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub vaccine_id: i64,
    pub appointment_date: NaiveDateTime,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BookingRequest {
    pub patient_id: i64,
    pub vaccine_id: i64,
    pub appointment_date: NaiveDateTime,
}

#[derive(Serialize)]
struct VaccinationUpdate<'a> {
    status: &'a str,
}

#[derive(Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Client { status: u16, message: String },

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn trailing_slash_is_stripped() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn vaccine_deserializes_from_backend_shape() {
        let json = r#"{
            "id": 3,
            "name": "Comirnaty",
            "manufacturer": "Pfizer-BioNTech",
            "doses_required": 2,
            "storage_requirements": "-70C"
        }"#;
        let vaccine: Vaccine = serde_json::from_str(json).unwrap();
        assert_eq!(vaccine.id, 3);
        assert_eq!(vaccine.name, "Comirnaty");
        assert_eq!(vaccine.doses_required, 2);
    }

    #[test]
    fn signup_request_omits_absent_role() {
        let request = SignupRequest {
            email: "user@example.com",
            password: "hunter2",
            role: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("role").is_none());

        let request = SignupRequest {
            role: Some("admin"),
            ..request
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn booking_serializes_naive_datetime() {
        let booking = BookingRequest {
            patient_id: 1,
            vaccine_id: 2,
            appointment_date: NaiveDate::from_ymd_opt(2026, 8, 7)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        };
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["appointment_date"], "2026-08-07T10:30:00");
    }

    #[test]
    fn appointment_parses_backend_datetime() {
        let json = r#"{
            "id": 7,
            "patient_id": 1,
            "vaccine_id": 2,
            "appointment_date": "2026-08-07T10:30:00",
            "status": "scheduled"
        }"#;
        let appointment: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(appointment.status, "scheduled");
        assert_eq!(appointment.appointment_date.to_string(), "2026-08-07 10:30:00");
    }

    #[test]
    fn errors_display_their_kind() {
        let err = ApiError::Client {
            status: 400,
            message: "Incorrect username or password".into(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Incorrect username or password");

        let err = ApiError::Network("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }
}
