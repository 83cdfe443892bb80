use clap::Args;
use serde::Serialize;
use snoutid_profile::{DogDetails, ProfileId};

use super::util::{open_store, print_json};
use crate::config::Config;
use crate::Cli;

/// List registered dogs.
#[derive(Args)]
pub struct ListCommand {}

#[derive(Serialize)]
struct Row<'a> {
    id: ProfileId,
    has_embedding: bool,
    #[serde(flatten)]
    details: &'a DogDetails,
}

impl ListCommand {
    pub async fn run(&self, cli: &Cli, cfg: &Config) -> anyhow::Result<()> {
        let store = open_store(cfg)?;
        let profiles = tokio::task::spawn_blocking(move || store.list_all()).await??;

        if cli.json {
            let rows: Vec<Row<'_>> = profiles
                .iter()
                .map(|p| Row {
                    id: p.id,
                    has_embedding: p.profile.has_embedding(),
                    details: &p.profile.details,
                })
                .collect();
            return print_json(&rows);
        }

        if profiles.is_empty() {
            println!("No dogs are registered in the database yet.");
            return Ok(());
        }
        for p in &profiles {
            let d = &p.profile.details;
            let breed = if d.breed.is_empty() { "-" } else { &d.breed };
            let nose = if p.profile.has_embedding() { "nose print" } else { "no nose print" };
            println!(
                "{:<8} {:<16} {:<16} {:<10} {}",
                p.id.to_string(),
                d.name,
                breed,
                d.dog_type.display_name(),
                nose
            );
        }
        Ok(())
    }
}
