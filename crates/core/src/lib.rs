pub mod calendar;
pub mod config;
pub mod ledger;
pub mod money;
pub mod period;

pub use calendar::{CalendarError, CutoffCalendar, PeriodStamp};
pub use config::{ConfigError, PlacementTable, SyncConfig};
pub use ledger::{DeductionIndex, LedgerRow, RecordType, RowKey};
pub use money::Money;
pub use period::{CompanyMonth, FiscalYear, Quarter};
