use clap::Parser;
use storefront_e2e::cli::commands::{RunOptions, cmd_list, cmd_run};
use storefront_e2e::cli::config::{Cli, Commands, is_ci, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(cli.config.as_deref());
    config.apply_env(|name| std::env::var(name).ok());

    match cli.command {
        Commands::Run {
            scenarios,
            format,
            output,
            interactive,
        } => {
            let options = RunOptions {
                scenarios,
                format,
                output,
                interactive,
                ci: is_ci(std::env::var("CI").ok().as_deref()),
            };
            let all_passed = cmd_run(&config, &options)?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::List => cmd_list(),
    }

    Ok(())
}
