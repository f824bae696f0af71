use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use mhr_core::{
    classify_status, constants::DEFAULT_RECORD_DATA_DIR, format_aog, CoreConfig, DeliveryDetails,
    NewPatient, NewTracking, PatientService, PregnancyOutcome, RecordUuid, TrackingService,
};
use mhr_types::NonEmptyText;

#[derive(Parser)]
#[command(name = "mhr")]
#[command(about = "MHR maternal-health record system CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    ListPatients,
    /// List all pregnancy trackings
    ListTrackings,
    /// Create a patient
    CreatePatient {
        first_name: String,
        last_name: String,
        /// Date of birth (YYYY-MM-DD)
        birth_date: NaiveDate,
        /// Barangay name (optional)
        #[arg(long)]
        barangay: Option<String>,
    },
    /// Open a pregnancy tracking for a patient
    CreateTracking {
        /// Patient UUID (32 lowercase hex characters)
        patient_id: String,
        /// Last menstrual period (YYYY-MM-DD, optional)
        #[arg(long)]
        lmp: Option<NaiveDate>,
        #[arg(long, default_value_t = 1)]
        gravidity: u32,
        #[arg(long, default_value_t = 0)]
        parity: u32,
        #[arg(long, default_value_t = 0)]
        abortion: u32,
    },
    /// Show the derived status and age of gestation for an LMP date
    Status {
        /// Last menstrual period (YYYY-MM-DD)
        lmp: NaiveDate,
    },
    /// Record a miscarriage/abortion outcome
    RecordMiscarriage {
        /// Tracking UUID
        tracking_id: String,
    },
    /// Record a completed-delivery outcome
    RecordDelivery {
        /// Tracking UUID
        tracking_id: String,
        sex: String,
        weight: String,
        place_of_delivery: String,
        /// Delivery date (YYYY-MM-DD)
        date_delivery: NaiveDate,
        /// PhilHealth member
        #[arg(long)]
        phic: bool,
    },
}

fn config() -> Arc<CoreConfig> {
    let record_data_dir =
        std::env::var("RECORD_DATA_DIR").unwrap_or_else(|_| DEFAULT_RECORD_DATA_DIR.into());
    Arc::new(CoreConfig::new(PathBuf::from(record_data_dir)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let today = Utc::now().date_naive();

    match cli.command {
        Some(Commands::ListPatients) => {
            let patients = PatientService::new(config()).list();
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {}, Age: {}, Address: {}",
                        patient.id, patient.fullname, patient.age, patient.address
                    );
                }
            }
        }
        Some(Commands::ListTrackings) => {
            let trackings = TrackingService::new(config()).list(None);
            if trackings.is_empty() {
                println!("No pregnancy trackings found.");
            } else {
                for tracking in trackings {
                    let status = tracking
                        .pregnancy_status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "unclassified".to_string());
                    let number = tracking
                        .tracking_number
                        .map(|n| n.to_string())
                        .unwrap_or_default();
                    println!(
                        "ID: {}, No: {}, Name: {}, Status: {}, G{}/P{}/A{}",
                        tracking.id,
                        number,
                        tracking.fullname,
                        status,
                        tracking.gravidity,
                        tracking.parity,
                        tracking.abortion
                    );
                }
            }
        }
        Some(Commands::CreatePatient {
            first_name,
            last_name,
            birth_date,
            barangay,
        }) => {
            let new = NewPatient {
                first_name: NonEmptyText::new(&first_name)?,
                last_name: NonEmptyText::new(&last_name)?,
                birth_date,
                zone: None,
                barangay,
                municipality: None,
                province: None,
            };
            match PatientService::new(config()).create(new, today) {
                Ok(patient) => println!("Created patient with UUID: {}", patient.id),
                Err(e) => eprintln!("Error creating patient: {}", e),
            }
        }
        Some(Commands::CreateTracking {
            patient_id,
            lmp,
            gravidity,
            parity,
            abortion,
        }) => {
            let cfg = config();
            let patient_id = RecordUuid::parse(&patient_id)?;
            let patient = PatientService::new(cfg.clone()).read(&patient_id)?;
            let new = NewTracking {
                lmp,
                gravidity,
                parity,
                abortion,
                phic: false,
                health_station: None,
                attending_physician: None,
                risk_codes: vec![],
            };
            match TrackingService::new(cfg).create(&patient, new, today) {
                Ok(tracking) => {
                    let number = tracking
                        .tracking_number
                        .map(|n| n.to_string())
                        .unwrap_or_default();
                    println!("Created tracking {} with UUID: {}", number, tracking.id);
                }
                Err(e) => eprintln!("Error creating tracking: {}", e),
            }
        }
        Some(Commands::Status { lmp }) => {
            println!(
                "Status: {}, AOG: {}",
                classify_status(lmp, today),
                format_aog(lmp, today)
            );
        }
        Some(Commands::RecordMiscarriage { tracking_id }) => {
            let tracking_id = RecordUuid::parse(&tracking_id)?;
            match TrackingService::new(config()).record_outcome(
                &tracking_id,
                PregnancyOutcome::Miscarriage,
                today,
            ) {
                Ok((_tracking, message)) => println!("{}", message),
                Err(e) => eprintln!("Error recording outcome: {}", e),
            }
        }
        Some(Commands::RecordDelivery {
            tracking_id,
            sex,
            weight,
            place_of_delivery,
            date_delivery,
            phic,
        }) => {
            let tracking_id = RecordUuid::parse(&tracking_id)?;
            let outcome = PregnancyOutcome::Delivery(DeliveryDetails {
                outcome_sex: sex,
                outcome_weight: weight,
                place_of_delivery,
                date_delivery,
                phic,
            });
            match TrackingService::new(config()).record_outcome(&tracking_id, outcome, today) {
                Ok((_tracking, message)) => println!("{}", message),
                Err(e) => eprintln!("Error recording outcome: {}", e),
            }
        }
        None => {
            println!("Use 'mhr --help' for commands");
        }
    }

    Ok(())
}
