pub mod driver;
pub mod error;
pub mod parser;
pub mod types;
