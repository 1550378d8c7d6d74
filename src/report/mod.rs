//! Rendering of comparison results. Rendering never alters the result, and
//! the same result always renders to the same bytes.

mod reporter;

pub use reporter::{LineStyle, ReportLine, Reporter, render};
