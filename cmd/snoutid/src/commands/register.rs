use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use snoutid_capture::{
    AcceptOutcome, CaptureStep, MotionHub, MotionSource, ShutterOutcome, StabilitySample,
};
use snoutid_identify::{Registrar, RegistrationSession, Submission};
use snoutid_profile::{DogColor, DogDetails, DogGender, DogType};
use tracing::{debug, info, warn};

use super::util::{open_extractor, open_store, print_json, FileCamera};
use crate::config::Config;
use crate::Cli;

/// Register a dog from nose, paw and two body photos.
///
/// The photos go through the same quality gate as a live capture; the nose
/// photo is used for identification.
#[derive(Args)]
pub struct RegisterCommand {
    /// Dog's name
    #[arg(long)]
    pub name: String,

    /// Breed
    #[arg(long, default_value = "")]
    pub breed: String,

    #[arg(long, value_enum, default_value_t = Gender::None)]
    pub gender: Gender,

    #[arg(long = "type", value_enum, default_value_t = Kind::Pet)]
    pub dog_type: Kind,

    #[arg(long, value_enum, default_value_t = Color::None)]
    pub color: Color,

    #[arg(long, value_enum, default_value_t = Color::None)]
    pub secondary_color: Color,

    /// Age in months
    #[arg(long, default_value_t = 0)]
    pub age_months: u32,

    #[arg(long)]
    pub owner: Option<String>,

    /// Adoption date (YYYY-MM-DD)
    #[arg(long)]
    pub adopted: Option<NaiveDate>,

    /// Vaccination date (YYYY-MM-DD), repeatable
    #[arg(long = "vaccinated")]
    pub vaccinations: Vec<NaiveDate>,

    #[arg(long)]
    pub microchip: Option<String>,

    /// Nose photo
    pub nose: PathBuf,
    /// Paw photo
    pub paw: PathBuf,
    /// First body photo
    pub body1: PathBuf,
    /// Second body photo
    pub body2: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Gender {
    Male,
    Female,
    None,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Kind {
    Pet,
    Street,
    Adopted,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Color {
    None,
    Black,
    White,
    Brown,
    Golden,
    Cream,
    Grey,
    Red,
}

impl From<Gender> for DogGender {
    fn from(g: Gender) -> Self {
        match g {
            Gender::Male => DogGender::Male,
            Gender::Female => DogGender::Female,
            Gender::None => DogGender::None,
        }
    }
}

impl From<Kind> for DogType {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Pet => DogType::Pet,
            Kind::Street => DogType::Street,
            Kind::Adopted => DogType::Adopted,
        }
    }
}

impl From<Color> for DogColor {
    fn from(c: Color) -> Self {
        match c {
            Color::None => DogColor::None,
            Color::Black => DogColor::Black,
            Color::White => DogColor::White,
            Color::Brown => DogColor::Brown,
            Color::Golden => DogColor::Golden,
            Color::Cream => DogColor::Cream,
            Color::Grey => DogColor::Grey,
            Color::Red => DogColor::Red,
        }
    }
}

impl RegisterCommand {
    fn details(&self) -> DogDetails {
        let mut details = DogDetails::new(&self.name).with_breed(&self.breed);
        details.gender = self.gender.into();
        details.dog_type = self.dog_type.into();
        details.primary_color = self.color.into();
        details.secondary_color = self.secondary_color.into();
        details.age_months = self.age_months;
        details.owner_name = self.owner.clone();
        details.adoption_date = self.adopted;
        details.microchip_number = self.microchip.clone();
        for &date in &self.vaccinations {
            details.add_vaccination(date);
        }
        details
    }

    pub async fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let registrar = Registrar::new(open_extractor(cfg)?, open_store(cfg)?);

        // Files don't shake: the hub reports the device at rest.
        let hub = Arc::new(MotionHub::new());
        let mut session =
            RegistrationSession::new(self.details(), Some(hub.clone() as Arc<dyn MotionSource>));
        hub.push(StabilitySample::AT_REST);

        let photos = [&self.nose, &self.paw, &self.body1, &self.body2];
        for (step, path) in CaptureStep::SHOTS.into_iter().zip(photos) {
            let outcome = session.shutter(&mut FileCamera::new(path))?;
            if outcome != ShutterOutcome::Captured {
                anyhow::bail!("{step}: shutter refused ({outcome:?})");
            }
            debug!(%step, frame = ?session.flow().pending(), "photo captured");
            match session.accept() {
                AcceptOutcome::Rejected { metrics, .. } => {
                    let reason = metrics
                        .rejection()
                        .map(|r| r.to_string())
                        .unwrap_or_default();
                    anyhow::bail!(
                        "{step} photo {}: Image rejected (too dark/blurry): {reason}, {metrics}",
                        path.display()
                    );
                }
                AcceptOutcome::NothingToReview => anyhow::bail!("{step}: nothing captured"),
                AcceptOutcome::Accepted { metrics, .. } | AcceptOutcome::Completed { metrics, .. } => {
                    info!(%step, %metrics, "photo accepted");
                }
            }
        }

        // Ctrl-C abandons the registration; nothing is written.
        let watcher = session.cancel_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, abandoning registration");
                watcher.cancel();
            }
        });

        let name = session.details().name.clone();
        let submission = registrar.submit(session).await?;
        if cli.json {
            return print_json(&submission);
        }
        match submission {
            Submission::Registered { id, with_embedding } => {
                println!("Registered {name} as {id}");
                if !with_embedding {
                    println!("Could not process the nose photo; saved without a nose print.");
                }
            }
            Submission::Cancelled => println!("Registration cancelled."),
        }
        Ok(())
    }
}
