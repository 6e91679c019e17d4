//! List command - show clients and projects in the document store.

use std::path::PathBuf;

use clap::Args;
use console::style;

use crate::store::LocalStore;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Document store root (overrides storage.root)
    #[arg(long)]
    root: Option<PathBuf>,
}

pub async fn run(args: ListArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(root) = args.root {
        config.storage.root = root;
    }

    let store = LocalStore::from_config(&config.storage);
    let clients = store.clients()?;

    if clients.is_empty() {
        println!(
            "{} No clients found under {}",
            style("ℹ").blue(),
            store.root().display()
        );
        return Ok(());
    }

    for (client, projects) in &clients {
        println!("{}", style(client).bold());
        for project in projects {
            println!("  - {}", project);
        }
    }

    Ok(())
}
