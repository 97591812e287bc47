pub mod replay;
pub use replay::*;

pub mod summary;
pub use summary::*;
