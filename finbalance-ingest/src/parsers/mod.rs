pub mod amount;

pub use amount::parse_amount;
