mod compose;
mod summary;
pub mod views;

pub use compose::{compose, pluralize_days, AlertMessage};
pub use summary::{aggregate, AlertReport};
