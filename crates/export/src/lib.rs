//! CSV writers for extracted rows, shaped to the warehouse table columns.
//! The writers are the only place rows meet a byte stream; everything
//! upstream stays pure.

use chrono::{Datelike, NaiveDate};
use std::io::Write;
use thiserror::Error;

use finsync_core::{LedgerRow, Money};
use finsync_xero::AtbRow;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub const LEDGER_HEADERS: &[&str] = &[
    "Year",
    "FinancialYear",
    "Month",
    "CompanyMonth",
    "Week",
    "InvoiceNumber",
    "Type",
    "ToClient",
    "KeyVal",
    "Description",
    "Contractor",
    "InvoiceDate",
    "InvoiceTotal",
    "EXTax",
    "Margin",
    "Office",
    "ConsultantCode",
    "Consultant",
    "Area",
    "Account",
    "AccountName",
    "PlacementCount",
    "CurrencyCode",
    "CurrencyRate",
    "UpdatedDate",
    "SourceId",
    "Quarter",
];

pub const ATB_HEADERS: &[&str] = &[
    "InvoiceNumber",
    "Type",
    "Contact",
    "InvoiceDate",
    "DueDate",
    "Reference",
    "Total",
    "Category",
    "Consultant",
];

/// Day-first date with no leading zeros, the format the report sheets use.
fn short_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// Bare decimal amount; the "$" display form is for humans, not warehouses.
fn money_cell(amount: Money) -> String {
    format!("{:.2}", amount.amount())
}

pub fn write_ledger_rows<W: Write>(out: W, rows: &[LedgerRow]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(LEDGER_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.year.to_string(),
            row.fiscal_year.to_string(),
            row.month.clone(),
            row.company_month.to_string(),
            row.week.to_string(),
            row.number.clone(),
            row.record_type.to_string(),
            row.client.clone(),
            row.key.clone(),
            row.description.clone(),
            row.contractor.clone(),
            short_date(row.date),
            money_cell(row.total),
            money_cell(row.ex_tax),
            row.margin.map(money_cell).unwrap_or_default(),
            row.office.clone(),
            row.consultant_code.clone(),
            row.consultant.clone(),
            row.area.clone(),
            row.account_code.clone(),
            row.account_name.clone(),
            row.placement.map(|p| p.to_string()).unwrap_or_default(),
            row.currency_code.clone(),
            row.currency_rate.to_string(),
            row.updated.map(short_date).unwrap_or_default(),
            row.source_id.clone(),
            row.quarter.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_atb_rows<W: Write>(out: W, rows: &[AtbRow]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(ATB_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.invoice_number.clone(),
            row.classification.clone(),
            row.contact.clone(),
            short_date(row.invoice_date),
            short_date(row.due_date),
            row.reference.clone(),
            money_cell(row.amount_due),
            row.category.clone(),
            row.consultant.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsync_core::{CompanyMonth, FiscalYear, Quarter, RecordType};
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_row() -> LedgerRow {
        LedgerRow {
            year: 2025,
            fiscal_year: FiscalYear::new(2025),
            month: "February".to_string(),
            company_month: CompanyMonth::Feb,
            week: 3,
            number: "TC-1001".to_string(),
            record_type: RecordType::Temp,
            client: "Acme Pty Ltd".to_string(),
            key: "2025:Feb:3:jane doe".to_string(),
            description: "Base Wage - contracting services of Jane Doe for the week".to_string(),
            contractor: "jane doe".to_string(),
            date: date(2025, 2, 10),
            total: Money::new(dec("110")).rounded(),
            ex_tax: Money::new(dec("100")).rounded(),
            margin: None,
            office: "Sydney".to_string(),
            consultant_code: "SMC003 Nina Calder".to_string(),
            consultant: "Nina Calder".to_string(),
            area: "Accounting & Finance".to_string(),
            account_code: "210".to_string(),
            account_name: "Revenue - Temporary and contracts".to_string(),
            placement: Some(Decimal::ZERO),
            currency_code: "AUD".to_string(),
            currency_rate: dec("1"),
            updated: Some(date(2025, 2, 11)),
            source_id: "id-TC-1001".to_string(),
            quarter: Quarter::Q3,
        }
    }

    #[test]
    fn ledger_csv_has_the_warehouse_header() {
        let mut buf = Vec::new();
        write_ledger_rows(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Year,FinancialYear,Month,CompanyMonth,Week,"));
    }

    #[test]
    fn dates_render_day_first_without_leading_zeros() {
        let mut buf = Vec::new();
        write_ledger_rows(&mut buf, &[sample_row()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("10/2/2025"));
        assert!(text.contains("11/2/2025"));
    }

    #[test]
    fn blank_margin_stays_blank() {
        let mut buf = Vec::new();
        write_ledger_rows(&mut buf, &[sample_row()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        // ...InvoiceTotal,EXTax,Margin,Office...
        assert!(text.contains("110.00,100.00,,Sydney"));
    }

    #[test]
    fn negative_amounts_survive_the_round_trip() {
        let mut row = sample_row();
        row.total = Money::new(dec("-110")).rounded();
        row.ex_tax = Money::new(dec("-100")).rounded();
        row.margin = Some(Money::new(dec("-100")).rounded());
        let mut buf = Vec::new();
        write_ledger_rows(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("-110.00,-100.00,-100.00"));
    }

    #[test]
    fn atb_csv_renders_rows() {
        let row = AtbRow {
            invoice_number: "INV-3001".to_string(),
            classification: "Invoices 90 days plus".to_string(),
            contact: "Acme Pty Ltd".to_string(),
            invoice_date: date(2025, 2, 10),
            due_date: date(2025, 3, 12),
            reference: "CFO search".to_string(),
            amount_due: Money::new(dec("600")).rounded(),
            category: "Sydney".to_string(),
            consultant: "SMC003 Nina Calder".to_string(),
        };
        let mut buf = Vec::new();
        write_atb_rows(&mut buf, &[row]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("INV-3001,Invoices 90 days plus,Acme Pty Ltd,10/2/2025,12/3/2025"));
    }
}
