//! Live adapters for real external interactions.

pub mod clock;
pub mod discovery;
pub mod filesystem;
pub mod git;
pub mod llm;
pub mod oracle;
pub mod runner;
pub mod shell;
