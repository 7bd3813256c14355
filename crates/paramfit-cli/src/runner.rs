use clap::{Parser, Subcommand};
use paramfit_common::config::AppConfig;
use paramfit_telemetry::init_telemetry;

use crate::example::run_estimator_transformer_param;

#[derive(Parser)]
#[command(version, name = "paramfit")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Fit a logistic regression with parameter overrides and print predictions")]
    EstimatorTransformerParam,
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(args);
    let config = AppConfig::load()?;
    init_telemetry(&config.telemetry)?;

    match cli.command.unwrap_or(Command::EstimatorTransformerParam) {
        Command::EstimatorTransformerParam => {
            let mut stdout = std::io::stdout().lock();
            run_estimator_transformer_param(config, &mut stdout)?;
        }
    }
    Ok(())
}
