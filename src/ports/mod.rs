//! Port traits defining external boundaries.
//!
//! Each trait is a seam between the orchestration core and something it
//! does not own: time, the filesystem, git, processes, the test engine,
//! test discovery, and the repair oracle. Implementations live in
//! `src/adapters/`.

pub mod clock;
pub mod discovery;
pub mod filesystem;
pub mod git;
pub mod llm;
pub mod oracle;
pub mod runner;
pub mod shell;

pub use clock::Clock;
pub use discovery::{DiscoveredMethod, TestDiscovery};
pub use filesystem::FileSystem;
pub use git::GitRepo;
pub use llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};
pub use oracle::{RepairFuture, RepairOracle, RepairRequest, RepairResponse};
pub use runner::{ExecutionReport, FailureDetail, TestRunner};
pub use shell::{ShellExecutor, ShellOutput};
