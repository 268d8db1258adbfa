//! kiln - build configuration helper CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use kiln_cli::cmd;
use kiln_cli::ui::ConsoleReporter;
use kiln_cli::{Cli, Commands, ThirdpartyCommands};
use kiln_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries flag strings for build scripts.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reporter = ConsoleReporter::new(cli.quiet);

    match cli.command {
        Commands::Flags {
            build_id,
            cpu,
            compiler,
            compiler_version,
            host,
            json,
        } => {
            let opts = cmd::flags::FlagsOptions {
                build_id,
                cpu,
                compiler,
                compiler_version,
                host,
                json,
            };
            cmd::flags::flags(&opts, &reporter)
        }
        Commands::Cpus { host } => cmd::cpus::cpus(host.as_deref()),
        Commands::Thirdparty { command } => {
            let config = Config::load()?;
            match command {
                ThirdpartyCommands::List { trunk } => {
                    cmd::thirdparty::list(&config, trunk.as_deref())
                }
                ThirdpartyCommands::Show { name } => cmd::thirdparty::show(&config, &name),
                ThirdpartyCommands::CmakeFlags { names } => {
                    cmd::thirdparty::cmake_flags(&config, &names)
                }
                ThirdpartyCommands::Fetch { names, trunk } => {
                    cmd::thirdparty::fetch(&config, &names, trunk, &reporter).await
                }
            }
        }
        Commands::Preprocess { source, output } => {
            cmd::preprocess::preprocess(&source, output.as_deref(), &reporter)
        }
    }
}
