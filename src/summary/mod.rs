//! Month over month comparison of spending per category.
//!
//! The comparison is shown on the summary page as a table with bar and pie
//! charts, and can be downloaded as a standalone SVG image.

mod aggregation;
mod download;
mod page;
mod period;
mod pie;
mod report;
mod svg;

pub use aggregation::round_money;
pub use download::get_summary_download;
pub use page::get_summary_page;
pub use period::Period;
