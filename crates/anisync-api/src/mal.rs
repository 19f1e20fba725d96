pub mod client;
pub mod error;
pub mod types;

pub use client::MalClient;
pub use error::MalError;
