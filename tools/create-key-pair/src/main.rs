//! Generates a fresh key pair for the GIF portal's base account and writes it
//! as a credential file the port can load back.

use std::path::PathBuf;

use anyhow::Context;
use chain_sol::Keypair;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(about, version)]
struct Cli {
    /// Where to write the credential file.
    #[arg(default_value = "./keypair.json")]
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.path.exists() {
        log::warn!("overwriting {}", cli.path.display());
    }

    let keypair = Keypair::generate();
    let json = keypair.to_json_string()?;
    std::fs::write(&cli.path, json)
        .with_context(|| format!("writing {}", cli.path.display()))?;

    // Reading it back catches a file the port could not load.
    let stored = Keypair::from_json_file(&cli.path)?;
    anyhow::ensure!(
        stored.pubkey() == keypair.pubkey(),
        "{} does not hold the generated key",
        cli.path.display()
    );

    log::info!("base account {} written to {}", keypair.address(), cli.path.display());
    Ok(())
}
