pub mod detection;
pub mod error;
pub mod model;

pub use detection::{AnalyzerTable, DetectionRecord, Granularity, SmellKind};
pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, SmellError};
pub use model::{
    ClassEntity, ClassMetrics, PackageEntity, PackageMetrics, ProjectModel, ProjectSummary,
    instability, package_key, qualified_name,
};
