use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "finsync", version, about = "Accounting-system extracts for reporting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build ledger rows from saved invoice, credit-note and journal exports.
    Ledger {
        /// Static tables: accounts, areas, placements, calendar cutoffs.
        #[arg(long)]
        config: PathBuf,
        /// Invoice list-endpoint payloads, one file per fetch.
        #[arg(long = "invoices", required = true)]
        invoices: Vec<PathBuf>,
        #[arg(long = "credit-notes")]
        credit_notes: Vec<PathBuf>,
        /// Wage-cost journals feeding the margin deduction index.
        #[arg(long)]
        deduction_journals: Option<PathBuf>,
        /// Revenue add-on journals appended as rows of their own.
        #[arg(long)]
        addon_journals: Option<PathBuf>,
        #[arg(long, default_value = "ledger.csv")]
        out: PathBuf,
    },
    /// Build the aged-receivables report from outstanding invoices.
    Atb {
        #[arg(long)]
        config: PathBuf,
        #[arg(long = "invoices", required = true)]
        invoices: Vec<PathBuf>,
        /// Aging reference date; defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
        #[arg(long, default_value = "atb.csv")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Ledger {
            config,
            invoices,
            credit_notes,
            deduction_journals,
            addon_journals,
            out,
        } => commands::run_ledger(
            &config,
            &invoices,
            &credit_notes,
            deduction_journals.as_deref(),
            addon_journals.as_deref(),
            &out,
        ),
        Command::Atb { config, invoices, as_of, out } => {
            let as_of = as_of.unwrap_or_else(|| chrono::Utc::now().date_naive());
            commands::run_atb(&config, &invoices, as_of, &out)
        }
    }
}
