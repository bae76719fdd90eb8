//! Authentication and user profile seams

mod profile;
mod token;

pub use profile::*;
pub use token::*;
