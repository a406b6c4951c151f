use anyhow::Result;
use clap::Parser;
use inkmap::config::{load_config, CliArgs, Command};
use inkmap::store::{DocumentStore, FileStore};
use inkmap::tree;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    if args.debug_config {
        println!("Configuration:");
        println!("{config:#?}");
        return Ok(());
    }

    let store = FileStore::new(&config.store_dir);
    match args.command {
        Some(Command::Show { doc_id }) => {
            let doc = store.get(&doc_id)?;
            println!("{}", tree::serialize(&doc.root));
        }
        Some(Command::List) | None => {
            for meta in store.list()? {
                println!("{}  {}", meta.id, meta.title);
            }
        }
    }

    Ok(())
}
