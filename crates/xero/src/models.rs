//! Serde models for the accounting API's list-endpoint payloads.
//!
//! Fields stay close to the wire: amounts are decimals, dates are the raw
//! `/Date(ms)/` strings (parsed downstream), and everything defaults so a
//! sparse record still deserializes.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceEnvelope {
    #[serde(default, rename = "Invoices")]
    pub invoices: Vec<Invoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreditNoteEnvelope {
    #[serde(default, rename = "CreditNotes")]
    pub credit_notes: Vec<CreditNote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualJournalEnvelope {
    #[serde(default, rename = "ManualJournals")]
    pub manual_journals: Vec<ManualJournal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Contact {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct TrackingOption {
    pub name: String,
    pub option: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LineItem {
    pub description: String,
    pub line_amount: Decimal,
    pub tax_amount: Decimal,
    pub unit_amount: Decimal,
    pub quantity: Decimal,
    pub account_code: String,
    pub tracking: Vec<TrackingOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Invoice {
    #[serde(rename = "InvoiceID")]
    pub invoice_id: String,
    pub invoice_number: String,
    /// "ACCREC" for receivables, "ACCPAY" for supplier bills.
    #[serde(rename = "Type")]
    pub invoice_type: String,
    pub status: String,
    pub reference: String,
    pub contact: Contact,
    pub date: String,
    pub due_date: String,
    pub line_items: Vec<LineItem>,
    pub currency_code: String,
    pub currency_rate: Option<Decimal>,
    pub amount_due: Option<Decimal>,
    #[serde(rename = "UpdatedDateUTC")]
    pub updated_date_utc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CreditNote {
    #[serde(rename = "CreditNoteID")]
    pub credit_note_id: String,
    pub credit_note_number: String,
    pub status: String,
    pub contact: Contact,
    pub date: String,
    pub line_items: Vec<LineItem>,
    pub currency_code: String,
    pub currency_rate: Option<Decimal>,
    #[serde(rename = "UpdatedDateUTC")]
    pub updated_date_utc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct JournalLine {
    pub description: String,
    pub line_amount: Decimal,
    pub account_code: String,
    pub tax_type: String,
    pub tracking: Vec<TrackingOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ManualJournal {
    #[serde(rename = "ManualJournalID")]
    pub manual_journal_id: String,
    pub narration: String,
    pub status: String,
    pub date: String,
    #[serde(rename = "UpdatedDateUTC")]
    pub updated_date_utc: String,
    pub journal_lines: Vec<JournalLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_an_invoice_envelope() {
        let payload = r#"{
            "Invoices": [{
                "InvoiceID": "7b9a-01",
                "InvoiceNumber": "TC-1001",
                "Type": "ACCREC",
                "Status": "AUTHORISED",
                "Contact": {"Name": "Acme Pty Ltd"},
                "Date": "\/Date(1714521600000+0000)\/",
                "LineItems": [{
                    "Description": "contracting services of Jane Doe for the week ending 5 May",
                    "LineAmount": 100.0,
                    "TaxAmount": 10.0,
                    "AccountCode": "210",
                    "Tracking": [
                        {"Name": "Category", "Option": "Sydney"},
                        {"Name": "Consultant", "Option": "SMC003 Nina Calder"}
                    ]
                }],
                "CurrencyCode": "AUD",
                "CurrencyRate": 1.0,
                "UpdatedDateUTC": "\/Date(1714608000000+0000)\/"
            }]
        }"#;
        let envelope: InvoiceEnvelope = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.invoices.len(), 1);
        let invoice = &envelope.invoices[0];
        assert_eq!(invoice.invoice_number, "TC-1001");
        assert_eq!(invoice.contact.name, "Acme Pty Ltd");
        assert_eq!(invoice.line_items[0].tracking[1].option, "SMC003 Nina Calder");
        assert_eq!(invoice.line_items[0].line_amount, Decimal::from(100));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let invoice: Invoice = serde_json::from_str(r#"{"InvoiceNumber": "INV-1"}"#).unwrap();
        assert_eq!(invoice.status, "");
        assert!(invoice.line_items.is_empty());
        assert_eq!(invoice.currency_rate, None);
    }

    #[test]
    fn deserializes_a_manual_journal() {
        let payload = r#"{
            "ManualJournals": [{
                "ManualJournalID": "mj-77",
                "Narration": "Temp wages w/e 9 Feb",
                "Status": "POSTED",
                "Date": "\/Date(1739059200000+0000)\/",
                "JournalLines": [{
                    "Description": "Wages: Jane Doe : 38",
                    "LineAmount": -1500.0,
                    "AccountCode": "210",
                    "TaxType": "BASEXCLUDED"
                }]
            }]
        }"#;
        let envelope: ManualJournalEnvelope = serde_json::from_str(payload).unwrap();
        let journal = &envelope.manual_journals[0];
        assert_eq!(journal.narration, "Temp wages w/e 9 Feb");
        assert_eq!(journal.journal_lines[0].line_amount, Decimal::from(-1500));
    }
}
