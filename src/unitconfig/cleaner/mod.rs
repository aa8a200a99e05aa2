pub mod columns;
pub mod config;
pub mod dedup;
pub mod error;
pub mod gate;
pub mod identifier;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod summary;
pub mod validate;

pub use config::{CleanerConfig, ExportFormat, ValidityRule};
pub use error::{Result, ToolError};
pub use gate::{
    DuplicateDecision, DuplicateReview, FixedGate, OperatorGate, ValidityDecision, ValidityReview,
};
pub use pipeline::{Cleaner, Progress};
pub use session::{FileKey, Session};
pub use summary::{DecisionStage, FileStatus, FileSummary};
