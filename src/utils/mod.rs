pub mod decimal;
pub use decimal::*;

pub mod files;
pub use files::*;

pub mod time;
pub use time::*;
