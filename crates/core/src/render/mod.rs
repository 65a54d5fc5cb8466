//! Tree rendering and output formatting

pub mod json;
pub mod line;
pub mod text;
pub mod tree;

pub use json::{render_json_lines, render_json_string};
pub use line::LineFormat;
pub use text::render_tree;
pub use tree::{RenderOutput, TreeRenderer};
