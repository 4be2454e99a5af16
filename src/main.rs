use clap::Parser;
use metaclonotypist::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{associate, evaluate},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Associate(_) => "associate",
        Command::Evaluate(_) => "evaluate",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Associate(args) => associate::associate(args)?,
        Command::Evaluate(args) => evaluate::evaluate(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
