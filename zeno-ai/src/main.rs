//! zeno CLI: runs the Telegram bot. Config from env (`.env` is loaded first); the token can be overridden.

use anyhow::Result;
use clap::{Parser, Subcommand};
use zeno_ai::{run_bot, AiConfig};
use zeno_telegram::BaseConfig;

#[derive(Parser)]
#[command(name = "zeno")]
#[command(about = "Zeno Telegram AI bot", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let base = BaseConfig::load(token)?;
            let ai = AiConfig::load()?;
            run_bot(base, ai).await
        }
    }
}
