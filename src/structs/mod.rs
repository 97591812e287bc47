pub mod asset;
pub use asset::*;

pub mod holding;
pub use holding::*;

pub mod transaction;
pub use transaction::*;

pub mod valuation;
pub use valuation::*;

pub mod market;
pub use market::*;

pub mod managers;
pub use managers::*;
