mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analysis::{AnalyzeArgs, CompareArgs, SellVsHoldArgs, SensitivityArgs};
use commands::financing::AmortizeArgs;
use commands::projection::ProjectArgs;

/// Property investment projections with decimal precision
#[derive(Parser)]
#[command(
    name = "pfa",
    version,
    about = "Property investment projections with decimal precision",
    long_about = "A CLI for projecting a leveraged property investment year by year: \
                  amortisation, rent, operating costs, tax effects, sale proceeds, \
                  IRR, benchmark comparison, sell-vs-hold and sensitivity analysis."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a loan amortisation schedule
    Amortize(AmortizeArgs),
    /// Project a property year by year over the holding period
    Project(ProjectArgs),
    /// Project, score and grade a property investment
    Analyze(AnalyzeArgs),
    /// Compare property profit against a benchmark investment
    Compare(CompareArgs),
    /// Sell today and invest the proceeds, or keep holding
    SellVsHold(SellVsHoldArgs),
    /// Tornado sensitivity of profit and IRR to each assumption
    Sensitivity(SensitivityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Compare(args) => commands::analysis::run_compare(args),
        Commands::SellVsHold(args) => commands::analysis::run_sell_vs_hold(args),
        Commands::Sensitivity(args) => commands::analysis::run_sensitivity(args),
        Commands::Version => {
            println!("pfa {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
