// Backend client: configuration, booked dates, booking and contact submission
// Everything else (calendar feeds, e-mail) happens server side.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendConfig;
use crate::quote::{NightlyRate, Quote, DATE_FORMAT};

pub const CONFIG_PATH: &str = "/api/config";
pub const BOOKED_DATES_PATH: &str = "/api/booked-dates";
pub const SUBMIT_PATH: &str = "/send-booking";
pub const CONTACT_PATH: &str = "/send-contact";
pub const CALENDAR_STATUS_PATH: &str = "/api/calendar-status";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("API error: {status_code} from {endpoint}")]
    ApiResponseError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    #[error("Client error: {0}")]
    ClientError(String),
}

// Body of GET /api/config. A missing or unusable rate means "keep the default".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    #[serde(default)]
    pub price_per_night: Option<f64>,
}

impl RemoteConfig {
    pub fn nightly_rate(&self) -> Option<NightlyRate> {
        self.price_per_night.and_then(NightlyRate::new)
    }
}

/// What the guest typed into the booking form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestDetails {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub checkin_time: String,
    pub checkout_time: String,
}

// Body of POST /send-booking
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub checkin_time: String,
    pub checkout_time: String,
    pub checkin: String,
    pub checkout: String,
    pub nights: u32,
    pub guests: u32,
    pub total: f64,
}

impl BookingSubmission {
    pub fn new(quote: &Quote, guest: &GuestDetails) -> Self {
        Self {
            full_name: guest.full_name.trim().to_string(),
            phone: guest.phone.trim().to_string(),
            email: guest.email.trim().to_string(),
            checkin_time: guest.checkin_time.clone(),
            checkout_time: guest.checkout_time.clone(),
            checkin: quote.range.checkin().format(DATE_FORMAT).to_string(),
            checkout: quote.range.checkout().format(DATE_FORMAT).to_string(),
            nights: quote.nights,
            guests: quote.guests,
            total: quote.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

// Body of POST /send-contact, answered like a booking submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Health of one calendar feed behind the booked-dates endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CalendarStatus {
    pub url: String,
    pub events: usize,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait BookingBackend: Send + Sync + 'static {
    // GET /api/config
    async fn fetch_config(&self) -> Result<RemoteConfig, ApiError>;

    // GET /api/booked-dates, ascending YYYY-MM-DD strings
    async fn fetch_booked_dates(&self) -> Result<Vec<String>, ApiError>;

    // POST /send-booking
    async fn submit_booking(
        &self,
        submission: &BookingSubmission,
    ) -> Result<SubmissionResponse, ApiError>;

    // POST /send-contact
    async fn submit_contact(
        &self,
        contact: &ContactMessage,
    ) -> Result<SubmissionResponse, ApiError>;

    // GET /api/calendar-status
    async fn fetch_calendar_status(&self) -> Result<Vec<CalendarStatus>, ApiError>;
}

pub struct HttpBookingClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBookingClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ApiError::ClientError(err.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::ApiResponseError {
                status_code: status.as_u16(),
                endpoint: path.to_string(),
            });
        }

        let body = response.text().await?;
        decode(path, &body)
    }

    async fn post_form<T>(&self, path: &str, form: &T) -> Result<SubmissionResponse, ApiError>
    where
        T: Serialize + Sync,
    {
        let response = self.http.post(self.url(path)).json(form).send().await?;

        // Failures come back as 500 with a JSON body, so decode regardless of status
        let status = response.status();
        let body = response.text().await?;
        let result: SubmissionResponse = decode(path, &body)?;
        tracing::debug!(
            endpoint = path,
            status = status.as_u16(),
            success = result.success,
            "Form response"
        );
        Ok(result)
    }
}

#[async_trait]
impl BookingBackend for HttpBookingClient {
    async fn fetch_config(&self) -> Result<RemoteConfig, ApiError> {
        tracing::debug!(url = %self.url(CONFIG_PATH), "Fetching widget config");
        self.get_json(CONFIG_PATH).await
    }

    async fn fetch_booked_dates(&self) -> Result<Vec<String>, ApiError> {
        tracing::debug!(url = %self.url(BOOKED_DATES_PATH), "Fetching booked dates");
        self.get_json(BOOKED_DATES_PATH).await
    }

    async fn submit_booking(
        &self,
        submission: &BookingSubmission,
    ) -> Result<SubmissionResponse, ApiError> {
        tracing::info!(
            checkin = %submission.checkin,
            checkout = %submission.checkout,
            nights = submission.nights,
            guests = submission.guests,
            "Sending booking request"
        );

        self.post_form(SUBMIT_PATH, submission).await
    }

    async fn submit_contact(
        &self,
        contact: &ContactMessage,
    ) -> Result<SubmissionResponse, ApiError> {
        tracing::info!(email = %contact.email, "Sending contact message");
        self.post_form(CONTACT_PATH, contact).await
    }

    async fn fetch_calendar_status(&self) -> Result<Vec<CalendarStatus>, ApiError> {
        tracing::debug!(url = %self.url(CALENDAR_STATUS_PATH), "Fetching calendar status");
        self.get_json(CALENDAR_STATUS_PATH).await
    }
}

fn decode<T>(endpoint: &str, body: &str) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::compute_quote;

    #[test]
    fn test_remote_config_rate() {
        let config: RemoteConfig = serde_json::from_str(r#"{"pricePerNight": 180}"#).unwrap();
        assert_eq!(config.nightly_rate().map(NightlyRate::get), Some(180.0));

        let empty: RemoteConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.nightly_rate(), None);

        let zero: RemoteConfig = serde_json::from_str(r#"{"pricePerNight": 0}"#).unwrap();
        assert_eq!(zero.nightly_rate(), None);
    }

    #[test]
    fn test_submission_wire_format() {
        let quote = compute_quote(
            Some("2024-06-01"),
            Some("2024-06-04"),
            2,
            NightlyRate::default(),
        )
        .unwrap();
        let guest = GuestDetails {
            full_name: " Ada Lovelace ".to_string(),
            phone: "+39 000 000".to_string(),
            email: "ada@example.com".to_string(),
            checkin_time: "15:00".to_string(),
            checkout_time: "10:00".to_string(),
        };

        let json = serde_json::to_value(BookingSubmission::new(&quote, &guest)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "fullName": "Ada Lovelace",
                "phone": "+39 000 000",
                "email": "ada@example.com",
                "checkinTime": "15:00",
                "checkoutTime": "10:00",
                "checkin": "2024-06-01",
                "checkout": "2024-06-04",
                "nights": 3,
                "guests": 2,
                "total": 450.0
            })
        );
    }

    #[test]
    fn test_calendar_status_wire_format() {
        let statuses: Vec<CalendarStatus> = serde_json::from_str(
            r#"[
                {"url": "https://a.example/cal.ics", "events": 4, "ok": true},
                {"url": "https://b.example/cal.ics", "events": 0, "ok": false, "error": "timeout"}
            ]"#,
        )
        .unwrap();

        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].ok);
        assert_eq!(statuses[0].error, None);
        assert_eq!(statuses[1].error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_decode_reports_endpoint() {
        let err = decode::<SubmissionResponse>(SUBMIT_PATH, "<html>").unwrap_err();
        match err {
            ApiError::InvalidResponse { endpoint, .. } => assert_eq!(endpoint, SUBMIT_PATH),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpBookingClient::new(&BackendConfig {
            base_url: "http://localhost:5000/".to_string(),
            timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(client.url(CONFIG_PATH), "http://localhost:5000/api/config");
    }
}
