// Booking session: loads backend data, quotes stays, submits bookings
// and turns every outcome into a localized notice.

use chrono::NaiveDate;
use parking_lot::RwLock;
use thiserror::Error;

use crate::api::{
    ApiError, BookingBackend, BookingSubmission, CalendarStatus, ContactMessage, GuestDetails,
    SubmissionResponse,
};
use crate::availability::BookedDates;
use crate::config::WidgetConfig;
use crate::messages::{Locale, MessageCatalog, MessageKind, Notice, NoticeLevel};
use crate::quote::{compute_quote, NightlyRate, Quote, QuoteError};

#[derive(Error, Debug)]
pub enum BookingError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("Check-in {checkin} is before today ({today})")]
    PastDates { checkin: NaiveDate, today: NaiveDate },

    #[error("Stay includes the already booked night of {date}")]
    DatesUnavailable { date: NaiveDate },

    #[error("An email address is required to confirm the booking")]
    MissingEmail,

    #[error("Booking submission failed: {0}")]
    SubmissionFailed(#[from] ApiError),
}

impl BookingError {
    pub fn message_kind(&self) -> MessageKind {
        match self {
            BookingError::Quote(QuoteError::MissingDates) => MessageKind::SelectDates,
            // A date that cannot be read is reported like a bad range
            BookingError::Quote(QuoteError::InvalidDateFormat(_))
            | BookingError::Quote(QuoteError::InvalidRange { .. }) => MessageKind::InvalidRange,
            BookingError::PastDates { .. } => MessageKind::PastDates,
            BookingError::DatesUnavailable { .. } => MessageKind::DatesUnavailable,
            BookingError::MissingEmail => MessageKind::MissingEmail,
            BookingError::SubmissionFailed(_) => MessageKind::SubmissionFailed,
        }
    }

    fn level(&self) -> NoticeLevel {
        match self {
            BookingError::Quote(_)
            | BookingError::PastDates { .. }
            | BookingError::DatesUnavailable { .. } => NoticeLevel::Warning,
            BookingError::MissingEmail | BookingError::SubmissionFailed(_) => NoticeLevel::Error,
        }
    }
}

// Result of BookingSession::load
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadReport {
    // The config endpoint answered with a readable body
    pub config_loaded: bool,
    // ...and that body carried a usable price per night
    pub rate_loaded: bool,
    pub booked_dates_loaded: bool,
    pub rate: NightlyRate,
    pub booked_count: usize,
}

#[derive(Debug, Default)]
struct SessionState {
    rate: NightlyRate,
    booked: BookedDates,
}

// Source of "today" for rejecting stays that start in the past
pub type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct BookingSession<B: BookingBackend> {
    backend: B,
    catalog: MessageCatalog,
    locale: Locale,
    default_rate: NightlyRate,
    clock: Clock,
    state: RwLock<SessionState>,
}

impl<B: BookingBackend> BookingSession<B> {
    pub fn new(backend: B, config: &WidgetConfig) -> Self {
        let default_rate = config.default_rate();
        Self {
            backend,
            catalog: MessageCatalog::builtin(),
            locale: config.locale.default,
            default_rate,
            clock: Box::new(|| chrono::Local::now().date_naive()),
            state: RwLock::new(SessionState {
                rate: default_rate,
                booked: BookedDates::default(),
            }),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_catalog(mut self, catalog: MessageCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replaces the local-time clock, e.g. to pin "today" in tests.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn rate(&self) -> NightlyRate {
        self.state.read().rate
    }

    pub fn booked_dates(&self) -> BookedDates {
        self.state.read().booked.clone()
    }

    /// Fetches config and booked dates concurrently.
    ///
    /// A failed fetch is logged and leaves the previous value in place.
    pub async fn load(&self) -> LoadReport {
        let (config, booked) = tokio::join!(
            self.backend.fetch_config(),
            self.backend.fetch_booked_dates()
        );

        let config_loaded = config.is_ok();
        let rate = match config {
            Ok(remote) => match remote.nightly_rate() {
                Some(rate) => {
                    tracing::info!(price_per_night = rate.get(), "Price per night loaded");
                    Some(rate)
                }
                None => {
                    tracing::warn!(
                        price_per_night = ?remote.price_per_night,
                        default = self.default_rate.get(),
                        "No usable price per night in config, keeping default"
                    );
                    None
                }
            },
            Err(err) => {
                tracing::error!(error = %err, "Error loading price config");
                None
            }
        };
        let rate_loaded = rate.is_some();

        let booked = match booked {
            Ok(entries) => {
                let booked = BookedDates::from_iso_strings(&entries);
                tracing::info!(count = booked.len(), "Booked dates loaded");
                Some(booked)
            }
            Err(err) => {
                tracing::error!(error = %err, "Error fetching booked dates");
                None
            }
        };
        let booked_dates_loaded = booked.is_some();

        let mut state = self.state.write();
        if let Some(rate) = rate {
            state.rate = rate;
        }
        if let Some(booked) = booked {
            state.booked = booked;
        }

        LoadReport {
            config_loaded,
            rate_loaded,
            booked_dates_loaded,
            rate: state.rate,
            booked_count: state.booked.len(),
        }
    }

    /// Quotes a stay at the session's current rate, refusing stays that start
    /// before today and stays that cover a booked night.
    pub fn quote(
        &self,
        checkin: Option<&str>,
        checkout: Option<&str>,
        guests: u32,
    ) -> Result<Quote, BookingError> {
        let state = self.state.read();
        let quote = compute_quote(checkin, checkout, guests, state.rate)?;

        let today = self.today();
        if quote.range.checkin() < today {
            return Err(BookingError::PastDates {
                checkin: quote.range.checkin(),
                today,
            });
        }

        // The check-out day may itself be booked: that guest arrives as this one leaves
        if let Some(date) = state.booked.first_conflict(&quote.range) {
            return Err(BookingError::DatesUnavailable { date });
        }

        tracing::debug!(
            nights = quote.nights,
            guests = quote.guests,
            total = quote.total,
            "Quote computed"
        );
        Ok(quote)
    }

    /// Sends the booking. A `success: false` answer is still `Ok`.
    pub async fn submit(
        &self,
        quote: &Quote,
        guest: &GuestDetails,
    ) -> Result<SubmissionResponse, BookingError> {
        if guest.email.trim().is_empty() {
            tracing::error!("No email provided in booking form");
            return Err(BookingError::MissingEmail);
        }

        let submission = BookingSubmission::new(quote, guest);
        let response = self
            .backend
            .submit_booking(&submission)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "Error submitting booking");
                BookingError::from(err)
            })?;

        tracing::info!(success = response.success, "Booking response received");
        Ok(response)
    }

    /// Sends a contact form. A `success: false` answer is still `Ok`.
    pub async fn send_contact(
        &self,
        contact: &ContactMessage,
    ) -> Result<SubmissionResponse, BookingError> {
        let response = self
            .backend
            .submit_contact(contact)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "Error sending contact message");
                BookingError::from(err)
            })?;

        tracing::info!(success = response.success, "Contact response received");
        Ok(response)
    }

    pub async fn calendar_status(&self) -> Result<Vec<CalendarStatus>, ApiError> {
        let statuses = self.backend.fetch_calendar_status().await?;
        for status in statuses.iter().filter(|status| !status.ok) {
            tracing::warn!(url = %status.url, error = ?status.error, "Calendar feed unavailable");
        }
        Ok(statuses)
    }

    pub fn notice_for_error(&self, err: &BookingError) -> Notice {
        self.notice(err.level(), err.message_kind(), None)
            .unwrap_or_else(|| Notice {
                level: err.level(),
                title: String::new(),
                message: err.to_string(),
            })
    }

    /// The server's own message is shown as the body when it sent one.
    pub fn notice_for_submission(&self, response: &SubmissionResponse) -> Notice {
        let (level, kind) = if response.success {
            (NoticeLevel::Success, MessageKind::BookingConfirmed)
        } else {
            (NoticeLevel::Error, MessageKind::BookingRejected)
        };
        let body = Some(response.message.as_str()).filter(|m| !m.trim().is_empty());

        self.notice(level, kind, body).unwrap_or_else(|| Notice {
            level,
            title: String::new(),
            message: response.message.clone(),
        })
    }

    fn notice(&self, level: NoticeLevel, kind: MessageKind, body: Option<&str>) -> Option<Notice> {
        let message = self.catalog.lookup(self.locale, kind)?;
        Some(Notice {
            level,
            title: message.title.clone(),
            message: body.unwrap_or(message.message.as_str()).to_string(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use mock_backend::MockBackend;

    fn guest(email: &str) -> GuestDetails {
        GuestDetails {
            full_name: "Mario Rossi".to_string(),
            phone: "+39 392 0000000".to_string(),
            email: email.to_string(),
            checkin_time: "15:00".to_string(),
            checkout_time: "10:00".to_string(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        crate::quote::parse_date(s).unwrap()
    }

    // All stays below lie after this day
    fn session(backend: MockBackend) -> BookingSession<MockBackend> {
        BookingSession::new(backend, &WidgetConfig::default()).with_clock(|| day("2024-01-01"))
    }

    #[tokio::test]
    async fn test_load_applies_remote_config_and_booked_dates() {
        let backend = MockBackend::new();
        backend.set_price_per_night(Some(180.0)).await;
        backend
            .set_booked_dates(&["2025-08-10", "2025-08-11", "bogus"])
            .await;

        let session = session(backend);
        let report = session.load().await;

        assert!(report.config_loaded);
        assert!(report.rate_loaded);
        assert!(report.booked_dates_loaded);
        assert_eq!(report.rate.get(), 180.0);
        assert_eq!(report.booked_count, 2);
        assert_eq!(session.rate().get(), 180.0);
    }

    #[tokio::test]
    async fn test_failed_loads_keep_defaults() {
        let backend = MockBackend::new();
        backend.set_price_per_night(Some(180.0)).await;
        backend.set_booked_dates(&["2025-08-10"]).await;
        backend.fail_config(true);
        backend.fail_booked_dates(true);

        let session = session(backend);
        let report = session.load().await;

        assert!(!report.config_loaded);
        assert!(!report.rate_loaded);
        assert!(!report.booked_dates_loaded);
        assert_eq!(report.rate, NightlyRate::default());
        assert!(session.booked_dates().is_empty());

        let quote = session
            .quote(Some("2025-08-09"), Some("2025-08-12"), 2)
            .unwrap();
        assert_eq!(quote.total, 450.0);
    }

    #[tokio::test]
    async fn test_missing_or_zero_rate_keeps_default() {
        for price in [None, Some(0.0), Some(-5.0)] {
            let backend = MockBackend::new();
            backend.set_price_per_night(price).await;

            let session = session(backend);
            let report = session.load().await;

            // The endpoint answered, it just had no usable rate
            assert!(report.config_loaded);
            assert!(!report.rate_loaded);
            assert!(report.booked_dates_loaded);
            assert_eq!(session.rate(), NightlyRate::default());
        }
    }

    #[tokio::test]
    async fn test_load_queries_both_endpoints() {
        let session = session(MockBackend::new());
        session.load().await;
        assert_eq!(session.backend.request_count(), 2);
    }

    #[tokio::test]
    async fn test_quote_rejects_booked_nights() {
        let backend = MockBackend::new();
        backend.set_booked_dates(&["2025-08-10"]).await;
        let session = session(backend);
        session.load().await;

        let err = session
            .quote(Some("2025-08-08"), Some("2025-08-12"), 2)
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::DatesUnavailable { date } if date == day("2025-08-10")
        ));

        // Arriving on the day a previous guest leaves is fine
        let quote = session
            .quote(Some("2025-08-11"), Some("2025-08-13"), 2)
            .unwrap();
        assert_eq!(quote.nights, 2);

        // So is leaving on the day a booking starts
        assert!(session.quote(Some("2025-08-07"), Some("2025-08-10"), 2).is_ok());
    }

    #[tokio::test]
    async fn test_checkout_on_booked_day_is_allowed() {
        let backend = MockBackend::new();
        backend
            .set_booked_dates(&["2025-08-10", "2025-08-11", "2025-08-12"])
            .await;
        let session = session(backend);
        session.load().await;

        let quote = session
            .quote(Some("2025-08-05"), Some("2025-08-10"), 2)
            .unwrap();
        assert_eq!(quote.nights, 5);
        assert_eq!(quote.range.checkout(), day("2025-08-10"));

        // One night later and the stay covers the first booked night
        let err = session
            .quote(Some("2025-08-05"), Some("2025-08-11"), 2)
            .unwrap_err();
        assert_eq!(err.message_kind(), MessageKind::DatesUnavailable);
    }

    #[test]
    fn test_quote_rejects_past_checkin() {
        let session = BookingSession::new(MockBackend::new(), &WidgetConfig::default())
            .with_locale(Locale::It)
            .with_clock(|| day("2025-08-10"));

        let err = session
            .quote(Some("2025-08-09"), Some("2025-08-12"), 2)
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::PastDates { checkin, today }
                if checkin == day("2025-08-09") && today == day("2025-08-10")
        ));
        assert_eq!(err.message_kind(), MessageKind::PastDates);

        let notice = session.notice_for_error(&err);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.title, "Data passata 🚫");

        // Arriving today is fine
        let quote = session
            .quote(Some("2025-08-10"), Some("2025-08-12"), 2)
            .unwrap();
        assert_eq!(quote.nights, 2);
    }

    #[test]
    fn test_past_check_comes_after_range_validation() {
        let session = BookingSession::new(MockBackend::new(), &WidgetConfig::default())
            .with_clock(|| day("2025-08-10"));

        // A reversed past range is still an invalid range first
        let err = session
            .quote(Some("2025-08-05"), Some("2025-08-01"), 1)
            .unwrap_err();
        assert_eq!(err.message_kind(), MessageKind::InvalidRange);
    }

    #[test]
    fn test_quote_validation_errors_map_to_messages() {
        let session = session(MockBackend::new());

        let missing = session.quote(None, Some("2025-08-10"), 1).unwrap_err();
        assert_eq!(missing.message_kind(), MessageKind::SelectDates);

        let reversed = session
            .quote(Some("2025-08-10"), Some("2025-08-01"), 1)
            .unwrap_err();
        assert_eq!(reversed.message_kind(), MessageKind::InvalidRange);

        let garbled = session
            .quote(Some("10/08/2025"), Some("2025-08-12"), 1)
            .unwrap_err();
        assert_eq!(garbled.message_kind(), MessageKind::InvalidRange);
    }

    #[test]
    fn test_error_notice_is_localized() {
        let session = session(MockBackend::new()).with_locale(Locale::De);
        let err = session.quote(Some("2025-08-10"), None, 1).unwrap_err();

        let notice = session.notice_for_error(&err);
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.title, "Hinweis ✨");
    }

    #[test]
    fn test_notice_falls_back_to_default_locale() {
        let mut catalog = MessageCatalog::new(Locale::En);
        catalog.insert(
            Locale::En,
            MessageKind::InvalidRange,
            crate::messages::Message {
                title: "Invalid dates".to_string(),
                message: "Check-out after check-in".to_string(),
            },
        );
        let session = session(MockBackend::new())
            .with_locale(Locale::Fr)
            .with_catalog(catalog);

        let err = session
            .quote(Some("2025-08-10"), Some("2025-08-10"), 1)
            .unwrap_err();
        let notice = session.notice_for_error(&err);
        assert_eq!(notice.title, "Invalid dates");

        // Nothing in either locale: the error text itself is shown
        let notice = session.notice_for_error(&BookingError::MissingEmail);
        assert_eq!(notice.message, BookingError::MissingEmail.to_string());
    }

    #[tokio::test]
    async fn test_submit_sends_quote_and_guest_details() {
        let session = session(MockBackend::new());
        let quote = session
            .quote(Some("2024-06-01"), Some("2024-06-04"), 3)
            .unwrap();

        let response = session.submit(&quote, &guest("mario@example.com")).await.unwrap();
        assert!(response.success);

        let sent = session.backend.submissions().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].email, "mario@example.com");
        assert_eq!(sent[0].checkin, "2024-06-01");
        assert_eq!(sent[0].nights, 3);
        assert_eq!(sent[0].guests, 3);
        assert_eq!(sent[0].total, 450.0);

        let notice = session.notice_for_submission(&response);
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "Booking email sent successfully!");
    }

    #[tokio::test]
    async fn test_submit_requires_email() {
        let session = session(MockBackend::new());
        let quote = session
            .quote(Some("2024-06-01"), Some("2024-06-04"), 1)
            .unwrap();

        let err = session.submit(&quote, &guest("  ")).await.unwrap_err();
        assert!(matches!(err, BookingError::MissingEmail));
        assert_eq!(session.backend.request_count(), 0);

        let notice = session.notice_for_error(&err);
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_submission_failure_is_reported() {
        let backend = MockBackend::new();
        backend.fail_submission(true);
        let session = session(backend).with_locale(Locale::It);
        let quote = session
            .quote(Some("2024-06-01"), Some("2024-06-02"), 1)
            .unwrap();

        let err = session.submit(&quote, &guest("a@b.it")).await.unwrap_err();
        assert!(matches!(err, BookingError::SubmissionFailed(_)));
        assert_eq!(err.message_kind(), MessageKind::SubmissionFailed);
        assert_eq!(session.notice_for_error(&err).title, "Errore ❌");
    }

    #[tokio::test]
    async fn test_rejected_submission_shows_server_message() {
        let backend = MockBackend::new();
        backend
            .set_submission_response(false, "Error sending email.")
            .await;
        let session = session(backend);
        let quote = session
            .quote(Some("2024-06-01"), Some("2024-06-02"), 1)
            .unwrap();

        let response = session.submit(&quote, &guest("a@b.it")).await.unwrap();
        assert!(!response.success);

        let notice = session.notice_for_submission(&response);
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Error sending email.");
    }

    #[tokio::test]
    async fn test_send_contact() {
        let session = session(MockBackend::new());
        let contact = ContactMessage {
            name: "Mario Rossi".to_string(),
            email: "mario@example.com".to_string(),
            message: "Is parking available?".to_string(),
        };

        let response = session.send_contact(&contact).await.unwrap();
        assert!(response.success);
        assert_eq!(session.backend.contacts().await, vec![contact]);
    }

    #[tokio::test]
    async fn test_send_contact_failure() {
        let backend = MockBackend::new();
        backend.fail_submission(true);
        let session = session(backend);

        let err = session
            .send_contact(&ContactMessage::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SubmissionFailed(_)));
        assert!(session.backend.contacts().await.is_empty());
    }

    #[tokio::test]
    async fn test_calendar_status() {
        let backend = MockBackend::new();
        backend
            .set_calendar_status(vec![
                CalendarStatus {
                    url: "https://a.example/cal.ics".to_string(),
                    events: 3,
                    ok: true,
                    error: None,
                },
                CalendarStatus {
                    url: "https://b.example/cal.ics".to_string(),
                    events: 0,
                    ok: false,
                    error: Some("timeout".to_string()),
                },
            ])
            .await;
        let session = session(backend);

        let statuses = session.calendar_status().await.unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses.iter().filter(|status| status.ok).count(), 1);
    }

    #[test]
    fn test_empty_server_message_uses_catalog() {
        let session = session(MockBackend::new());
        let notice = session.notice_for_submission(&SubmissionResponse {
            success: true,
            message: String::new(),
        });
        assert_eq!(notice.message, "Your booking request has been sent.");
    }

    #[test]
    fn test_session_shared_across_threads() {
        let session = std::sync::Arc::new(session(MockBackend::new()));
        tokio_test::block_on(session.load());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = std::sync::Arc::clone(&session);
                std::thread::spawn(move || {
                    session
                        .quote(Some("2024-06-01"), Some("2024-06-08"), 2)
                        .map(|q| q.total)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 1050.0);
        }
    }
}
