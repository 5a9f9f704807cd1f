use frame_host::cli::{Cli, Command, remove_cache};
use frame_host::session::{default_log_dir, resolve_config_dir, run};

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            config_dir,
            log_dir,
            address,
        } => match resolve_config_dir(config_dir) {
            Ok(config_dir) => {
                let log_dir = log_dir.unwrap_or_else(default_log_dir);
                run(&config_dir, &log_dir, address.as_deref()).await
            }
            Err(e) => Err(e),
        },
        Command::RemoveCache { root } => {
            let root = root.unwrap_or_else(|| PathBuf::from("."));
            remove_cache(&root).map(|removed| println!("Removed {removed} cache director(ies)"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
