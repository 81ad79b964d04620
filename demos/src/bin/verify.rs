//! # Verify
//!
//! Run a single verification against the operator gateway and print the
//! result as JSON.
//!
//! ```text
//! verify age --phone +34629255833 --threshold 21
//! verify location --phone +34629255833 --area madrid
//! ```

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use credibil_ciba::flows::location::Area;
use credibil_ciba::flows::poker::PokerRegistration;
use credibil_ciba::flows::{casino, kyc, location, poker, sim_swap};
use credibil_ciba::{
    AgeVerificationRequest, CibaClient, Config, DEFAULT_AGE_THRESHOLD, DEFAULT_MAX_AGE,
    ErrorResponse, KycMatchRequest,
};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(version, about = "Verify a customer by phone number")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check the customer meets an age threshold.
    Age {
        #[command(flatten)]
        phone: Phone,

        /// Minimum age in years.
        #[arg(long, default_value_t = DEFAULT_AGE_THRESHOLD)]
        threshold: u8,
    },

    /// Age-gate a casino withdrawal.
    Withdraw {
        #[command(flatten)]
        phone: Phone,

        /// Amount to withdraw, in euros.
        #[arg(long)]
        amount: f64,
    },

    /// Match customer details against the operator's records.
    Kyc {
        #[command(flatten)]
        phone: Phone,

        #[command(flatten)]
        details: Details,
    },

    /// Register a poker player: identity match then age check.
    Poker {
        #[command(flatten)]
        phone: Phone,

        #[command(flatten)]
        details: Details,

        /// Minimum age in years.
        #[arg(long)]
        threshold: Option<u8>,
    },

    /// Check the customer's device is within an area.
    Location {
        #[command(flatten)]
        phone: Phone,

        /// Preset area: madrid, barcelona, valencia or sevilla.
        #[arg(long, conflicts_with_all = ["latitude", "longitude"])]
        area: Option<String>,

        /// Latitude of the area centre.
        #[arg(long, requires = "longitude", allow_negative_numbers = true)]
        latitude: Option<f64>,

        /// Longitude of the area centre.
        #[arg(long, requires = "latitude", allow_negative_numbers = true)]
        longitude: Option<f64>,

        /// Area radius in km.
        #[arg(long, default_value_t = 10)]
        accuracy: u32,
    },

    /// Check whether the customer's SIM changed recently.
    SimSwap {
        #[command(flatten)]
        phone: Phone,

        /// Look-back window in hours.
        #[arg(long, default_value_t = DEFAULT_MAX_AGE)]
        max_age: u16,
    },
}

#[derive(Args)]
struct Phone {
    /// Phone number in E.164 format, e.g. +34629255833.
    #[arg(long)]
    phone: String,
}

#[derive(Args)]
struct Details {
    /// Identity document number.
    #[arg(long)]
    id_document: Option<String>,

    /// Given name.
    #[arg(long)]
    given_name: Option<String>,

    /// Family name.
    #[arg(long)]
    family_name: Option<String>,

    /// Birthdate (YYYY-MM-DD).
    #[arg(long)]
    birthdate: Option<String>,

    /// Email address.
    #[arg(long)]
    email: Option<String>,

    /// Full address.
    #[arg(long)]
    address: Option<String>,
}

impl From<Details> for KycMatchRequest {
    fn from(details: Details) -> Self {
        Self {
            id_document: details.id_document,
            given_name: details.given_name,
            family_name: details.family_name,
            birthdate: details.birthdate,
            email: details.email,
            address: details.address,
            ..Self::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber =
        FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = Config::load()?;
    let client = CibaClient::from_config(&config)?;

    if !client.check_connectivity().await {
        tracing::warn!("gateway at {} is not reachable", client.base_url());
    }

    match cli.command {
        Command::Age { phone, threshold } => print(
            client
                .perform_full_verification(&phone.phone, &AgeVerificationRequest::new(threshold))
                .await,
        ),
        Command::Withdraw { phone, amount } => {
            let request = casino::WithdrawRequest {
                phone_number: phone.phone,
                amount,
            };
            print(casino::withdraw(&client, &request).await)
        }
        Command::Kyc { phone, details } => {
            print(kyc::verify_customer(&client, &phone.phone, &details.into()).await)
        }
        Command::Poker {
            phone,
            details,
            threshold,
        } => {
            let registration = PokerRegistration {
                phone_number: phone.phone,
                details: details.into(),
                age_threshold: threshold,
            };
            print(poker::register_player(&client, &registration).await)
        }
        Command::Location {
            phone,
            area,
            latitude,
            longitude,
            accuracy,
        } => {
            let area = match (area, latitude, longitude) {
                (Some(name), ..) => {
                    Area::preset(&name).ok_or_else(|| anyhow!("unknown area: {name}"))?
                }
                (None, Some(latitude), Some(longitude)) => Area::new(latitude, longitude, accuracy),
                _ => return Err(anyhow!("an area or coordinates are required")),
            };
            print(location::verify_location(&client, &phone.phone, &area).await)
        }
        Command::SimSwap { phone, max_age } => {
            print(sim_swap::check(&client, &phone.phone, max_age).await)
        }
    }
}

// Print the result, or the classified error, as JSON. A failed verification
// is reported as an error exit.
fn print<T: Serialize>(result: credibil_ciba::Result<T>) -> Result<()> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            Err(e.into())
        }
    }
}
