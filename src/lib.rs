pub mod cart;
pub mod config;
pub mod converter;
pub mod error;
pub mod midi;
pub mod translator;

pub use converter::Converter;
pub use error::Error;
