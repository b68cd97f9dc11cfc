pub mod client;
pub mod error;
pub mod payload;

pub use client::{Fetch, FetchRequest, NightscoutClient};
pub use error::FetchError;
