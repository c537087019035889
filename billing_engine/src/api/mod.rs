pub mod errors;
pub mod objects;
pub mod transaction_api;
