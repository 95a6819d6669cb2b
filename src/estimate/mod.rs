pub mod absorption;
pub mod emission;
pub mod factors;

pub use absorption::*;
pub use emission::*;
pub use factors::*;
