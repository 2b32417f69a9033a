use clap::Parser;
use kdbxcore::cli::{Cli, Commands, LOG_ENV};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Hash { ref file, sha512 } => {
            kdbxcore::cli::commands::hash::execute(&cli, file, sha512)
        }
        Commands::Reveal {
            ref xml,
            ref stream_key,
        } => kdbxcore::cli::commands::reveal::execute(&cli, xml, stream_key),
        Commands::Resalt {
            ref xml,
            ref stream_key,
            ref output,
        } => kdbxcore::cli::commands::resalt::execute(&cli, xml, stream_key, output.as_deref()),
        Commands::Protect {
            ref xml,
            ref output,
        } => kdbxcore::cli::commands::protect::execute(&cli, xml, output.as_deref()),
        Commands::Derive { ref salt } => kdbxcore::cli::commands::derive::execute(&cli, salt),
    };

    if let Err(e) = result {
        kdbxcore::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
