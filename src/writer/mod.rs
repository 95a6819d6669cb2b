pub mod json;
pub mod schema_gen;
pub mod sqlite;
pub mod value;

pub use json::*;
pub use sqlite::*;
