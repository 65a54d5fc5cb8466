//! ptree-core: process tree reconstruction for ptree
//!
//! This crate turns a flat batch of process-creation records into process
//! trees: one target with its ancestors and descendants, or a forest of
//! every root in the data.
//!
//! # Modules
//!
//! - [`models`] - Records, per-process metadata, rendered lines
//! - [`normalize`] - Field value coercion and time parsing
//! - [`index`] - Process index built from records
//! - [`select`] - Forest roots and ancestor chains
//! - [`render`] - Tree rendering (text, JSON)
//! - [`report`] - The Report struct and the run entry point
//! - [`output`] - Result records for tree and table modes
//!
//! # Example
//!
//! ```
//! use ptree_core::{run, FieldValue, PtreeOptions, Record};
//!
//! let mut record = Record::new();
//! record.insert("pid".into(), FieldValue::Integer(1));
//! record.insert("path".into(), FieldValue::from("init"));
//! let output = run(&[record], &PtreeOptions::default());
//! assert_eq!(output.len(), 1);
//! ```

pub mod error;
pub mod index;
pub mod models;
pub mod normalize;
pub mod options;
pub mod output;
pub mod render;
pub mod report;
pub mod select;
pub mod strptime;

// Re-export commonly used types at crate root
pub use error::{PtreeError, PtreeResult};
pub use index::{FieldMap, ProcessIndex};
pub use models::{
    FieldValue, LineKind, ParsedTime, ProcessMeta, Record, RenderedLine, Target, Warning,
};
pub use options::{OutputMode, PtreeOptions};
pub use output::{assemble, assemble_result, ErrorResult, OutputRecord, TableRow, TreeResult};
pub use report::{build_report, Report};

/// Build the report for `records` and assemble it for `options.mode`
pub fn run(records: &[Record], options: &PtreeOptions) -> Vec<OutputRecord> {
    assemble_result(&build_report(records, options), options.mode)
}
