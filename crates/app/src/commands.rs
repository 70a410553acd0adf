use anyhow::Context;
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use finsync_core::{DeductionIndex, SyncConfig};
use finsync_export::{write_atb_rows, write_ledger_rows};
use finsync_xero::{
    addon_rows, build_atb_rows, build_deduction_index, parse_journals, CreditNote,
    CreditNoteEnvelope, Invoice, InvoiceEnvelope, JournalRole, LineExtractor,
    ManualJournalEnvelope, Skip,
};

fn load_invoices(paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<Invoice>> {
    let mut invoices = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let envelope: InvoiceEnvelope = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        invoices.extend(envelope.invoices);
    }
    Ok(invoices)
}

fn load_credit_notes(paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<CreditNote>> {
    let mut notes = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let envelope: CreditNoteEnvelope = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        notes.extend(envelope.credit_notes);
    }
    Ok(notes)
}

fn load_journals(path: &Path) -> anyhow::Result<ManualJournalEnvelope> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

fn log_skips(skips: &[Skip]) {
    for skip in skips {
        tracing::debug!(source = %skip.source_id, number = %skip.number, reason = %skip.reason, "dropped");
    }
    if !skips.is_empty() {
        tracing::warn!(count = skips.len(), "lines or records dropped this run");
    }
}

pub fn run_ledger(
    config_path: &Path,
    invoice_paths: &[impl AsRef<Path>],
    credit_note_paths: &[impl AsRef<Path>],
    deduction_journals: Option<&Path>,
    addon_journals: Option<&Path>,
    out: &Path,
) -> anyhow::Result<()> {
    let config = SyncConfig::load(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let invoices = load_invoices(invoice_paths)?;
    let credit_notes = load_credit_notes(credit_note_paths)?;

    let mut journal_skips = Vec::new();
    let deductions = match deduction_journals {
        Some(path) => {
            let envelope = load_journals(path)?;
            let (rows, skips) =
                parse_journals(&envelope.manual_journals, JournalRole::Deductions, &config);
            journal_skips.extend(skips);
            build_deduction_index(&rows)
        }
        None => DeductionIndex::new(),
    };

    let extractor = LineExtractor::new(&config, &deductions);
    let mut extraction = extractor.extract_all(&invoices, &credit_notes);

    if let Some(path) = addon_journals {
        let envelope = load_journals(path)?;
        let (rows, skips) =
            parse_journals(&envelope.manual_journals, JournalRole::AddOns, &config);
        journal_skips.extend(skips);
        extraction.rows.extend(addon_rows(&rows, &config));
    }

    let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    write_ledger_rows(file, &extraction.rows)?;

    log_skips(&extraction.skips);
    log_skips(&journal_skips);
    tracing::info!(
        rows = extraction.rows.len(),
        skipped = extraction.skips.len() + journal_skips.len(),
        retracted = extraction.deleted.len(),
        out = %out.display(),
        "ledger extract complete"
    );
    Ok(())
}

pub fn run_atb(
    config_path: &Path,
    invoice_paths: &[impl AsRef<Path>],
    as_of: NaiveDate,
    out: &Path,
) -> anyhow::Result<()> {
    let config = SyncConfig::load(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let invoices = load_invoices(invoice_paths)?;

    let (rows, skips) = build_atb_rows(&invoices, as_of, &config.home_currency);

    let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    write_atb_rows(file, &rows)?;

    log_skips(&skips);
    tracing::info!(rows = rows.len(), skipped = skips.len(), out = %out.display(), "aged receivables report complete");
    Ok(())
}
