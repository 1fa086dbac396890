use std::path::PathBuf;

use anyhow::Context;
use booking_widget::logger;
use booking_widget::{
    BookedDates, BookingBackend, BookingSession, ContactMessage, GuestDetails, HttpBookingClient,
    Locale, WidgetConfig,
};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "booking-widget", about = "Quote and book stays against the booking backend")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the backend base URL
    #[arg(long)]
    base_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the nights that can no longer be booked
    BookedDates,
    /// Price a stay
    Quote(StayArgs),
    /// Price a stay and send the booking request
    Book {
        #[command(flatten)]
        stay: StayArgs,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        checkin_time: String,
        #[arg(long, default_value = "")]
        checkout_time: String,
    },
    /// Send a message through the contact form
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Show whether each calendar feed behind the booked dates is reachable
    CalendarStatus,
}

#[derive(Debug, Args)]
struct StayArgs {
    /// Check-in date (YYYY-MM-DD)
    #[arg(long)]
    checkin: Option<String>,
    /// Check-out date (YYYY-MM-DD)
    #[arg(long)]
    checkout: Option<String>,
    #[arg(long, default_value_t = 1)]
    guests: u32,
    /// Page language, e.g. "it" or "en-GB"
    #[arg(long)]
    lang: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => WidgetConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => WidgetConfig::default(),
    };
    if let Some(base_url) = cli.base_url {
        config.backend.base_url = base_url;
        config.validate()?;
    }

    let client = HttpBookingClient::new(&config.backend)?;
    tracing::debug!(base_url = client.base_url(), "Backend client ready");

    match cli.command {
        Command::BookedDates => {
            let booked = BookedDates::from_iso_strings(client.fetch_booked_dates().await?);
            for date in booked.iter() {
                println!("{date}");
            }
        }
        Command::Quote(stay) => {
            let session = open_session(client, &config, &stay).await;
            match session.quote(stay.checkin.as_deref(), stay.checkout.as_deref(), stay.guests) {
                Ok(quote) => println!("{}", serde_json::to_string_pretty(&quote)?),
                Err(err) => {
                    eprintln!("{}", session.notice_for_error(&err));
                    std::process::exit(1);
                }
            }
        }
        Command::Book {
            stay,
            full_name,
            phone,
            email,
            checkin_time,
            checkout_time,
        } => {
            let session = open_session(client, &config, &stay).await;
            let guest = GuestDetails {
                full_name,
                phone,
                email,
                checkin_time,
                checkout_time,
            };

            let outcome = match session.quote(
                stay.checkin.as_deref(),
                stay.checkout.as_deref(),
                stay.guests,
            ) {
                Ok(quote) => session.submit(&quote, &guest).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(response) => {
                    println!("{}", session.notice_for_submission(&response));
                    if !response.success {
                        std::process::exit(1);
                    }
                }
                Err(err) => {
                    eprintln!("{}", session.notice_for_error(&err));
                    std::process::exit(1);
                }
            }
        }
        Command::Contact {
            name,
            email,
            message,
        } => {
            let contact = ContactMessage {
                name,
                email,
                message,
            };
            let response = client
                .submit_contact(&contact)
                .await
                .context("sending contact message")?;
            println!("{}", response.message);
            if !response.success {
                std::process::exit(1);
            }
        }
        Command::CalendarStatus => {
            let statuses = client.fetch_calendar_status().await?;
            println!("{}", serde_json::to_string_pretty(&statuses)?);
            if statuses.iter().any(|status| !status.ok) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn open_session<B: BookingBackend>(
    backend: B,
    config: &WidgetConfig,
    stay: &StayArgs,
) -> BookingSession<B> {
    // Unsupported tags fall back to the configured locale, not the catalog's
    let locale = Locale::resolve(stay.lang.as_deref(), config.locale.default);

    let session = BookingSession::new(backend, config).with_locale(locale);
    let report = session.load().await;
    tracing::debug!(?report, "Session loaded");
    session
}
