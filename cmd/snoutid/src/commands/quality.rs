use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use snoutid_capture::{quality, QualityMetrics};

use super::util::{print_json, read_frame};
use crate::Cli;

/// Score a photo with the capture quality gate.
#[derive(Args)]
pub struct QualityCommand {
    /// Image file (JPEG, PNG, ...)
    pub image: PathBuf,
}

#[derive(Serialize)]
struct QualityOutput<'a> {
    image: &'a str,
    #[serde(flatten)]
    metrics: QualityMetrics,
    rejection: Option<String>,
}

impl QualityCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let frame = read_frame(&self.image)?;
        let metrics = quality::evaluate(&frame);

        if cli.json {
            let image = self.image.to_string_lossy();
            return print_json(&QualityOutput {
                image: &image,
                metrics,
                rejection: metrics.rejection().map(|r| r.to_string()),
            });
        }

        println!("{}: {metrics}", self.image.display());
        match metrics.rejection() {
            None => println!("Image accepted"),
            Some(reason) => println!("Image rejected (too dark/blurry): {reason}"),
        }
        Ok(())
    }
}
