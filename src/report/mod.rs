//! Report rendering: plain text, HTML pages and the downloadable PDF

pub mod document;
pub mod pages;
pub mod view;

pub use document::{ReportDocument, ReportWriter};
pub use pages::PageRenderer;
pub use view::ReportView;
