//! CLI command implementations.
//!
//! - **analyze**: read an evaluation export and write an agreement report
//! - **init**: write a default `.evalmap.toml`

pub mod analyze;
pub mod init;
