use clap::{Parser, Subcommand};

mod aggregate;
mod cmd;
mod gains;
mod records;
mod summary;
mod tax;
mod vocab;
mod warnings;
mod workbook;

#[derive(Parser, Debug)]
#[command(
    name = "itrprep",
    version,
    about = "Consolidate Form 16, AIS, TIS and broker P&L statements into an ITR-2 ready summary"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline over the four source files and export the summary
    Prepare(cmd::prepare::PrepareCommand),
    /// Show the slab/rate table in effect for a fiscal year
    Rules(cmd::rules::RulesCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Prepare(command) => command.exec(),
        Command::Rules(command) => command.exec(),
    }
}
