pub mod api;
pub use api::*;

pub mod ledger_error;
pub use ledger_error::*;

pub mod export_error;
pub use export_error::*;

pub mod app_error;
pub use app_error::*;
