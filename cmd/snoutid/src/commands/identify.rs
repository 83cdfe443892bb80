use std::path::PathBuf;

use clap::Args;
use snoutid_identify::Identifier;

use super::util::{open_extractor, open_store, print_json};
use crate::config::Config;
use crate::Cli;

/// Identify a dog from a nose photo.
#[derive(Args)]
pub struct IdentifyCommand {
    /// Nose photo (JPEG, PNG, ...)
    pub image: PathBuf,
}

impl IdentifyCommand {
    pub async fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let identifier = Identifier::new(open_extractor(cfg)?, open_store(cfg)?);
        let data = tokio::fs::read(&self.image).await?;
        let report = identifier.identify_encoded(data).await?;

        if cli.json {
            return print_json(&report);
        }
        println!("{report}");
        Ok(())
    }
}
