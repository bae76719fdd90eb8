//! Record store API: operations, queries, pagination, execution

mod crud;
mod execute;
mod list;
mod page;
mod pages;

pub use crud::*;
pub use list::*;

pub(crate) use execute::decode_json;
pub use page::*;
pub use pages::*;
