//! Application services for the history ledger.

mod ledger;

pub use ledger::{
    HistoryLedgerService, HistoryServiceError, HistoryServiceResult, RecordHistoryRequest,
};
