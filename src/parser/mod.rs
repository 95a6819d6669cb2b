pub mod record;
pub mod tables;

pub use record::*;
pub use tables::*;
