mod money;
mod secret;

pub mod op;

pub use money::{Money, MoneyConversionError};
pub use secret::Secret;
