pub mod tables;
pub use tables::*;

pub mod export;
pub use export::*;
