pub mod sqlite;
pub mod traits;
