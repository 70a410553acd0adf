//! Aged-receivables rows: outstanding customer invoices split per consultant
//! for the aged-trial-balance report.

use chrono::NaiveDate;
use finsync_core::Money;
use rust_decimal::Decimal;

use crate::dates::parse_api_date;
use crate::extract::{Skip, SkipReason};
use crate::models::Invoice;

#[derive(Debug, Clone, PartialEq)]
pub struct AtbRow {
    pub invoice_number: String,
    /// "Commencement Retainer", "Invoices 90 days plus", or empty.
    pub classification: String,
    pub contact: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub reference: String,
    /// This consultant's share of the amount due, in the home currency.
    pub amount_due: Money,
    pub category: String,
    pub consultant: String,
}

/// Builds aged-receivables rows from outstanding ACCREC invoices.
///
/// The amount due is converted to the home currency, then split across line
/// items proportionally by quantity, one row per consultant-tracked line.
/// `as_of` drives the 90-day aging so callers control the clock.
pub fn build_atb_rows(
    invoices: &[Invoice],
    as_of: NaiveDate,
    home_currency: &str,
) -> (Vec<AtbRow>, Vec<Skip>) {
    let mut rows = Vec::new();
    let mut skips = Vec::new();

    for invoice in invoices {
        if invoice.invoice_type != "ACCREC" {
            continue;
        }
        let number = &invoice.invoice_number;
        let (Some(invoice_date), Some(due_date)) =
            (parse_api_date(&invoice.date), parse_api_date(&invoice.due_date))
        else {
            skips.push(Skip {
                source_id: invoice.invoice_id.clone(),
                number: number.clone(),
                reason: SkipReason::BadDate(invoice.date.clone()),
            });
            continue;
        };

        let mut classification = String::new();
        if invoice.reference.contains("Retainer Commencement") {
            classification = "Commencement Retainer".to_string();
        }
        if (as_of - invoice_date).num_days() > 90 {
            classification = "Invoices 90 days plus".to_string();
        }

        let mut amount_due = Money::new(invoice.amount_due.unwrap_or_default());
        let rate = invoice.currency_rate.unwrap_or(Decimal::ONE);
        if invoice.currency_code != home_currency && !rate.is_zero() {
            amount_due = amount_due.convert(rate);
        }

        let category = invoice
            .line_items
            .iter()
            .flat_map(|line| &line.tracking)
            .find(|t| t.name == "Category")
            .map(|t| t.option.clone())
            .unwrap_or_default();

        let total_quantity: Decimal = invoice.line_items.iter().map(|l| l.quantity).sum();

        for line in &invoice.line_items {
            if line.quantity.is_zero() {
                continue;
            }
            let mut consultant = String::from("No Consultant");
            for t in &line.tracking {
                if t.name == "Consultant" {
                    consultant = t.option.clone();
                    break;
                }
            }
            // A consultant tracking entry with an empty option is dirty data;
            // the line is unattributable.
            if consultant.is_empty() {
                continue;
            }
            if total_quantity.is_zero() {
                continue;
            }

            rows.push(AtbRow {
                invoice_number: number.clone(),
                classification: classification.clone(),
                contact: invoice.contact.name.clone(),
                invoice_date,
                due_date,
                reference: invoice.reference.clone(),
                amount_due: (amount_due * (line.quantity / total_quantity)).rounded(),
                category: category.clone(),
                consultant,
            });
        }
    }
    (rows, skips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, LineItem, TrackingOption};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ms_date(d: NaiveDate) -> String {
        let seconds = d.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        format!("/Date({seconds}000+0000)/")
    }

    fn tracked_line(quantity: &str, consultant: Option<&str>) -> LineItem {
        let mut tracking = vec![TrackingOption {
            name: "Category".into(),
            option: "Sydney".into(),
        }];
        if let Some(name) = consultant {
            tracking.push(TrackingOption { name: "Consultant".into(), option: name.into() });
        }
        LineItem { quantity: dec(quantity), tracking, ..LineItem::default() }
    }

    fn outstanding(number: &str, lines: Vec<LineItem>) -> Invoice {
        Invoice {
            invoice_id: format!("id-{number}"),
            invoice_number: number.to_string(),
            invoice_type: "ACCREC".to_string(),
            status: "AUTHORISED".to_string(),
            contact: Contact { name: "Acme Pty Ltd".to_string() },
            date: ms_date(date(2025, 2, 10)),
            due_date: ms_date(date(2025, 3, 12)),
            amount_due: Some(dec("900")),
            currency_code: "AUD".to_string(),
            line_items: lines,
            ..Invoice::default()
        }
    }

    #[test]
    fn splits_the_amount_due_by_quantity() {
        let inv = outstanding(
            "INV-3001",
            vec![
                tracked_line("2", Some("SMC003 Nina Calder")),
                tracked_line("1", Some("PEK001 Kevin Mercer")),
            ],
        );
        let (rows, skips) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert!(skips.is_empty());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount_due, Money::new(dec("600")));
        assert_eq!(rows[1].amount_due, Money::new(dec("300")));
        assert_eq!(rows[0].consultant, "SMC003 Nina Calder");
        assert_eq!(rows[0].category, "Sydney");
    }

    #[test]
    fn retainer_reference_classifies_the_invoice() {
        let mut inv = outstanding("INV-3002", vec![tracked_line("1", None)]);
        inv.reference = "Retainer Commencement - CFO search".to_string();
        let (rows, _) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert_eq!(rows[0].classification, "Commencement Retainer");
        assert_eq!(rows[0].consultant, "No Consultant");
    }

    #[test]
    fn age_beyond_ninety_days_wins_over_retainer() {
        let mut inv = outstanding("INV-3003", vec![tracked_line("1", None)]);
        inv.reference = "Retainer Commencement - CFO search".to_string();
        let (rows, _) = build_atb_rows(&[inv], date(2025, 6, 1), "AUD");
        assert_eq!(rows[0].classification, "Invoices 90 days plus");
    }

    #[test]
    fn recent_unreferenced_invoices_have_no_classification() {
        let inv = outstanding("INV-3004", vec![tracked_line("1", None)]);
        let (rows, _) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert_eq!(rows[0].classification, "");
    }

    #[test]
    fn foreign_amounts_convert_to_home_currency() {
        let mut inv = outstanding("INV-3005", vec![tracked_line("1", None)]);
        inv.currency_code = "USD".to_string();
        inv.currency_rate = Some(dec("1.5"));
        let (rows, _) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert_eq!(rows[0].amount_due, Money::new(dec("600")));
    }

    #[test]
    fn zero_quantity_lines_are_not_attributed() {
        let inv = outstanding(
            "INV-3006",
            vec![tracked_line("0", Some("SMC003 Nina Calder")), tracked_line("3", None)],
        );
        let (rows, _) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount_due, Money::new(dec("900")));
    }

    #[test]
    fn payables_are_ignored() {
        let mut inv = outstanding("BILL-1", vec![tracked_line("1", None)]);
        inv.invoice_type = "ACCPAY".to_string();
        let (rows, _) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert!(rows.is_empty());
    }

    #[test]
    fn bad_dates_are_reported() {
        let mut inv = outstanding("INV-3007", vec![tracked_line("1", None)]);
        inv.due_date = String::new();
        let (rows, skips) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert!(rows.is_empty());
        assert!(matches!(skips[0].reason, SkipReason::BadDate(_)));
    }

    #[test]
    fn empty_consultant_option_drops_the_line() {
        let inv = outstanding("INV-3008", vec![tracked_line("1", Some(""))]);
        let (rows, _) = build_atb_rows(&[inv], date(2025, 3, 1), "AUD");
        assert!(rows.is_empty());
    }
}
