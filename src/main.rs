mod app;
mod cli;

use clap::Parser;
use cli::{Cli, Command, InitArgs, RunArgs};
use relay_core::config::Config;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => cmd_run(args),
        Command::Init(args) => cmd_init(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    if !Path::new(&args.config).exists() {
        Config::write_starter(&args.config)?;
        println!("No config found. Wrote a starter config to {}.", args.config);
        println!("Set OPENROUTER_API_KEY (or edit the file) and run again.");
        return Ok(());
    }

    // Load once up front; logging needs to know where to write before anything else runs.
    let config = Config::load(&args.config)?;
    let _guard = relay_core::lifecycle::logging::init_logging(
        &args.log_level,
        config.logging_to_file,
        config.log_dir.as_deref(),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let application = app::Application::build(config, &args)?;
        application.serve().await
    })
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    if Config::write_starter(&args.config)? {
        println!("Wrote starter config to {}.", args.config);
    } else {
        println!("{} already exists, leaving it untouched.", args.config);
    }
    Ok(())
}
