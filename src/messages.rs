// Localized popup messages: locale -> kind -> message, falling back to a default locale

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    It,
    #[default]
    En,
    Fr,
    De,
}

impl Locale {
    pub const ALL: [Locale; 4] = [Locale::It, Locale::En, Locale::Fr, Locale::De];

    /// Parses a page language tag such as `"it"` or `"en-GB"`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "it" => Some(Locale::It),
            "en" => Some(Locale::En),
            "fr" => Some(Locale::Fr),
            "de" => Some(Locale::De),
            _ => None,
        }
    }

    /// Locale for an optional page language tag. Missing or unsupported
    /// tags resolve to `fallback`.
    pub fn resolve(tag: Option<&str>, fallback: Locale) -> Locale {
        tag.and_then(Locale::from_tag).unwrap_or(fallback)
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::It => "it",
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::De => "de",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    SelectDates,
    InvalidRange,
    PastDates,
    DatesUnavailable,
    MissingEmail,
    BookingConfirmed,
    BookingRejected,
    SubmissionFailed,
}

impl MessageKind {
    pub const ALL: [MessageKind; 8] = [
        MessageKind::SelectDates,
        MessageKind::InvalidRange,
        MessageKind::PastDates,
        MessageKind::DatesUnavailable,
        MessageKind::MissingEmail,
        MessageKind::BookingConfirmed,
        MessageKind::BookingRejected,
        MessageKind::SubmissionFailed,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub title: String,
    pub message: String,
}

impl Message {
    fn new(title: &str, message: &str) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageCatalog {
    default_locale: Locale,
    entries: HashMap<Locale, HashMap<MessageKind, Message>>,
}

impl MessageCatalog {
    pub fn new(default_locale: Locale) -> Self {
        Self {
            default_locale,
            entries: HashMap::new(),
        }
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    pub fn insert(&mut self, locale: Locale, kind: MessageKind, message: Message) {
        self.entries.entry(locale).or_default().insert(kind, message);
    }

    /// Looks up `kind` in `locale`, then in the default locale.
    pub fn lookup(&self, locale: Locale, kind: MessageKind) -> Option<&Message> {
        self.get(locale, kind).or_else(|| {
            tracing::debug!(
                %locale,
                ?kind,
                fallback = %self.default_locale,
                "Message falls back to default locale"
            );
            self.get(self.default_locale, kind)
        })
    }

    fn get(&self, locale: Locale, kind: MessageKind) -> Option<&Message> {
        self.entries.get(&locale).and_then(|messages| messages.get(&kind))
    }

    /// The messages shipped with the widget, with English as fallback.
    pub fn builtin() -> Self {
        use MessageKind::*;

        let mut catalog = Self::new(Locale::En);
        let table: [(Locale, MessageKind, &str, &str); 32] = [
            (
                Locale::It,
                SelectDates,
                "Attenzione ✨",
                "Per favore seleziona sia la data di check-in che quella di check-out \
                 per continuare.",
            ),
            (
                Locale::It,
                InvalidRange,
                "Data non valida 🚫",
                "La data di check-out deve essere successiva alla data di check-in.",
            ),
            (
                Locale::It,
                PastDates,
                "Data passata 🚫",
                "La data di check-in non può essere nel passato.",
            ),
            (
                Locale::It,
                DatesUnavailable,
                "Date non disponibili 🚫",
                "Alcune notti del periodo selezionato sono già prenotate.",
            ),
            (
                Locale::It,
                MissingEmail,
                "Errore",
                "Inserisci un indirizzo email valido per confermare la prenotazione.",
            ),
            (
                Locale::It,
                BookingConfirmed,
                "Prenotazione Confermata 🎉",
                "La tua richiesta di prenotazione è stata inviata.",
            ),
            (
                Locale::It,
                BookingRejected,
                "Errore ❌",
                "Impossibile completare la prenotazione.",
            ),
            (
                Locale::It,
                SubmissionFailed,
                "Errore ❌",
                "Invio della prenotazione non riuscito. Riprova.",
            ),
            (
                Locale::En,
                SelectDates,
                "Heads up ✨",
                "Please select both your check-in and check-out dates to proceed.",
            ),
            (
                Locale::En,
                InvalidRange,
                "Invalid dates 🚫",
                "Your check-out date must come after your check-in date.",
            ),
            (
                Locale::En,
                PastDates,
                "Date in the past 🚫",
                "Your check-in date cannot be in the past.",
            ),
            (
                Locale::En,
                DatesUnavailable,
                "Dates unavailable 🚫",
                "Some nights in your selected stay are already booked.",
            ),
            (
                Locale::En,
                MissingEmail,
                "Error",
                "Please enter a valid email address to confirm your booking.",
            ),
            (
                Locale::En,
                BookingConfirmed,
                "Booking Confirmed 🎉",
                "Your booking request has been sent.",
            ),
            (
                Locale::En,
                BookingRejected,
                "Error ❌",
                "Your booking could not be completed.",
            ),
            (
                Locale::En,
                SubmissionFailed,
                "Error ❌",
                "Failed to send booking. Please try again.",
            ),
            (
                Locale::Fr,
                SelectDates,
                "Attention ✨",
                "Veuillez sélectionner à la fois la date d’arrivée et de départ pour continuer.",
            ),
            (
                Locale::Fr,
                InvalidRange,
                "Dates invalides 🚫",
                "La date de départ doit être postérieure à la date d’arrivée.",
            ),
            (
                Locale::Fr,
                PastDates,
                "Date passée 🚫",
                "La date d’arrivée ne peut pas être dans le passé.",
            ),
            (
                Locale::Fr,
                DatesUnavailable,
                "Dates indisponibles 🚫",
                "Certaines nuits de votre séjour sont déjà réservées.",
            ),
            (
                Locale::Fr,
                MissingEmail,
                "Erreur",
                "Veuillez saisir une adresse e-mail valide pour confirmer la réservation.",
            ),
            (
                Locale::Fr,
                BookingConfirmed,
                "Réservation confirmée 🎉",
                "Votre demande de réservation a été envoyée.",
            ),
            (
                Locale::Fr,
                BookingRejected,
                "Erreur ❌",
                "Votre réservation n’a pas pu être finalisée.",
            ),
            (
                Locale::Fr,
                SubmissionFailed,
                "Erreur ❌",
                "Échec de l’envoi de la réservation. Veuillez réessayer.",
            ),
            (
                Locale::De,
                SelectDates,
                "Hinweis ✨",
                "Bitte wählen Sie sowohl Check-in- als auch Check-out-Datum, um fortzufahren.",
            ),
            (
                Locale::De,
                InvalidRange,
                "Ungültiges Datum 🚫",
                "Das Check-out-Datum muss nach dem Check-in-Datum liegen.",
            ),
            (
                Locale::De,
                PastDates,
                "Datum in der Vergangenheit 🚫",
                "Das Check-in-Datum darf nicht in der Vergangenheit liegen.",
            ),
            (
                Locale::De,
                DatesUnavailable,
                "Nicht verfügbar 🚫",
                "Einige Nächte Ihres Aufenthalts sind bereits gebucht.",
            ),
            (
                Locale::De,
                MissingEmail,
                "Fehler",
                "Bitte geben Sie eine gültige E-Mail-Adresse ein, um die Buchung zu bestätigen.",
            ),
            (
                Locale::De,
                BookingConfirmed,
                "Buchung bestätigt 🎉",
                "Ihre Buchungsanfrage wurde gesendet.",
            ),
            (
                Locale::De,
                BookingRejected,
                "Fehler ❌",
                "Ihre Buchung konnte nicht abgeschlossen werden.",
            ),
            (
                Locale::De,
                SubmissionFailed,
                "Fehler ❌",
                "Die Buchung konnte nicht gesendet werden. Bitte versuchen Sie es erneut.",
            ),
        ];

        for (locale, kind, title, message) in table {
            catalog.insert(locale, kind, Message::new(title, message));
        }
        catalog
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
    Success,
}

// What the page shows in its popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title, self.message)
    }
}
