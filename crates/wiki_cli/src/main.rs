//! Wiki CLI
//!
//! Command-line administration for a wiki content store.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "wiki")]
#[command(about = "Wiki content store administration", version, long_about = None)]
struct Cli {
    #[command(flatten)]
    store: commands::StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the core library is linked
    Ping,
    /// Test that the configured database can be opened
    Test,
    /// Drop and recreate the schema (destroys all content)
    Install,
    /// Upgrade the schema and reset site preferences
    Upgrade,
    /// Page operations
    Pages(commands::pages::PagesArgs),
    /// List every distinct tag
    Tags,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ping => {
            println!("wiki_core ping={}", wiki_core::ping());
            println!("wiki_core version={}", wiki_core::core_version());
            Ok(())
        }
        Commands::Test => commands::admin::test(&cli.store),
        Commands::Install => commands::admin::install(&cli.store),
        Commands::Upgrade => commands::admin::upgrade(&cli.store),
        Commands::Pages(args) => commands::pages::execute(&cli.store, args),
        Commands::Tags => commands::pages::tags(&cli.store),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
