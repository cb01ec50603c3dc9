pub mod calendar;
pub mod frontmatter;
pub mod heatmap;
pub mod record_store;
pub mod scanner;
