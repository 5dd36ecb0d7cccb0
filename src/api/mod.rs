pub mod extract;
pub mod format;

pub use extract::{Pagination, ValidJson};
