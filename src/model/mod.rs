//! Data model for schema-less records

mod record;
mod serde_impl;
mod value;

pub use record::*;
pub use value::*;
