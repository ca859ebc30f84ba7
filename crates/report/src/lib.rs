//! Dossier report: paginated layout and PDF output for canonical scan facts.
//!
//! Layout is computed first as a pure `Document` of positioned blocks, then
//! painted by the renderer, then handed to a sink. Each stage completes
//! before the next starts.

pub mod compose;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod paginate;
pub mod pipeline;
pub mod render;
pub mod sink;
pub mod table;

pub use compose::{GenerationMeta, LayoutEngine, ReportInputs};
pub use config::{ColumnKey, ColumnSpec, LayoutConfig};
pub use document::{Block, Document, Footer, Orientation, Page, PageState};
pub use error::{LayoutError, ReportError};
pub use logging::init_logging;
pub use paginate::{balance_two_columns, paginate_rows, ColumnSplit, Cursor, SafeArea, TablePlan};
pub use pipeline::{GeneratedReport, ReportGenerator, ReportPlan, ReportSummary};
pub use render::PdfRenderer;
pub use sink::{write_file_atomic, write_file_atomic_async, write_to, write_to_async};
pub use table::{measure_row, solve_width_units, solve_widths, Column, MeasuredRow, RowStyle};
