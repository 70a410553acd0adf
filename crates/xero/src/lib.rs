pub mod contractor;
pub mod dates;
pub mod extract;
pub mod journal;
pub mod models;
pub mod receivables;

pub use contractor::extract_contractor;
pub use dates::parse_api_date;
pub use extract::{Extraction, LineExtractor, Skip, SkipReason};
pub use journal::{addon_rows, build_deduction_index, parse_journals, JournalLineRow, JournalRole};
pub use models::{
    Contact, CreditNote, CreditNoteEnvelope, Invoice, InvoiceEnvelope, JournalLine, LineItem,
    ManualJournal, ManualJournalEnvelope, TrackingOption,
};
pub use receivables::{build_atb_rows, AtbRow};
