use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use fabricgen::config_loader::{self, OutputFormat, STDIO_PATH};
use fabricgen::orchestrator::{self, GeneratedResource};
use fabricgen::resource::{ResourceBundle, ResourceList};
use fabricgen::results::{to_result_items, RunError};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Expand fabric definitions and templates into nodes, links and IP allocation requests
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ResourceList to read ("-" for stdin)
    #[arg(short, long, default_value = STDIO_PATH)]
    input: PathBuf,

    /// Where to write the resulting ResourceList ("-" for stdout)
    #[arg(short, long, default_value = STDIO_PATH)]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit only generated resources, dropping the input items
    #[arg(long)]
    generated_only: bool,
}

fn main() -> Result<ExitCode> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Logs go to stderr; stdout carries the ResourceList
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    info!("Starting fabricgen");
    let input = config_loader::load_resource_list(&args.input)?;

    let mut output = ResourceList {
        function_config: input.function_config.clone(),
        ..ResourceList::default()
    };
    if !args.generated_only {
        output.items = input.items.clone();
    }

    let config = match config_loader::function_config(&input) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid function configuration: {}", e);
            output.results = to_result_items(&[RunError::from(e)], 0);
            config_loader::write_resource_list(&args.output, &output, args.format)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let bundle = ResourceBundle::from_items(&input.items);
    let run = orchestrator::run(&bundle, &config);

    output.results = to_result_items(&run.errors, run.outputs.len());
    output.items.extend(run.outputs.into_iter().map(GeneratedResource::into_item));
    config_loader::write_resource_list(&args.output, &output, args.format)?;

    if run.success {
        info!("Fabric generation completed successfully");
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Fabric generation failed with {} errors", run.errors.iter().filter(|e| e.is_fatal()).count());
        Ok(ExitCode::FAILURE)
    }
}
