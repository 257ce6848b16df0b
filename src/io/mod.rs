pub mod input;
pub mod output;

pub use input::read_export;
pub use output::{create_writer, OutputFormat, OutputWriter};
