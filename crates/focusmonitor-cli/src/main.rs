use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "focusmonitor", version, about = "Focus Monitor CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Focus history and statistics
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::History { action } => commands::history::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
