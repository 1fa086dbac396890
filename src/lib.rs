// Booking widget core: quote calculation, availability, localized messages
// and the client side of the booking backend.

pub mod api;
pub mod availability;
pub mod config;
#[cfg(feature = "cli")]
pub mod logger;
pub mod messages;
pub mod quote;
pub mod session;

// Re-export key types for convenience
pub use api::{
    ApiError, BookingBackend, BookingSubmission, CalendarStatus, ContactMessage, GuestDetails,
    HttpBookingClient, RemoteConfig, SubmissionResponse,
};
pub use availability::BookedDates;
pub use config::{ConfigError, WidgetConfig};
pub use messages::{Locale, Message, MessageCatalog, MessageKind, Notice, NoticeLevel};
pub use quote::{compute_quote, DateRange, NightlyRate, Quote, QuoteError};
pub use session::{BookingError, BookingSession, Clock, LoadReport};
