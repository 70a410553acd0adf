//! Contractor-name extraction from free-text invoice line descriptions.
//!
//! Payroll descriptions follow a handful of templated shapes ("Base Wage -
//! contracting services of Jane Doe for the week ending ..."). The rules below
//! are substring markers evaluated strictly in order; the first rule whose
//! prefix and start marker both match claims the description, even when its
//! end marker is then missing. A description matching no rule yields no
//! contractor rather than a guess.

use finsync_core::RecordType;

struct ExtractRule {
    /// Description must start with this, when present.
    prefix: Option<&'static str>,
    start: &'static str,
    end: &'static str,
}

const RULES: &[ExtractRule] = &[
    ExtractRule { prefix: Some("Base Wage -"), start: "Public Holiday of ", end: " for the week" },
    ExtractRule { prefix: Some("Base Wage -"), start: "personal leave of ", end: " for the week" },
    ExtractRule { prefix: Some("Base Wage -"), start: "sick leave of ", end: " for the week" },
    ExtractRule {
        prefix: Some("Base Wage -"),
        start: "contracting services of ",
        end: " for the week",
    },
    ExtractRule { prefix: Some("Annual Leave -"), start: " of ", end: " for the week" },
    ExtractRule { prefix: Some("Annual Leave Payout -"), start: " of ", end: " on " },
    ExtractRule { prefix: None, start: "contracting services of ", end: " for the week" },
];

/// Pulls the contractor name out of a temp-invoice line description.
/// Non-temp records never carry one.
pub fn extract_contractor(record_type: RecordType, description: &str) -> Option<String> {
    if record_type != RecordType::Temp {
        return None;
    }
    for rule in RULES {
        if let Some(prefix) = rule.prefix {
            if !description.starts_with(prefix) {
                continue;
            }
        }
        let Some(at) = description.find(rule.start) else {
            continue;
        };
        let rest = &description[at + rule.start.len()..];
        return rest.find(rule.end).map(|end| rest[..end].trim().to_string());
    }
    None
}
