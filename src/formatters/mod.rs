pub mod json;
pub mod summary;

pub use json::JsonFormatter;
pub use summary::SummaryFormatter;
