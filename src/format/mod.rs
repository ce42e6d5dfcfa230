pub mod json;

pub use json::{Json, Path};

/// A wire format for message payloads.
pub trait Format {
    type Item;
    type Error: std::error::Error + Send + Sync + 'static;

    fn deserialize(v: &[u8]) -> Result<Self::Item, Self::Error>;
}
