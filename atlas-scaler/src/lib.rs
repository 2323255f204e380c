pub mod cli;
pub mod error;
pub mod project;
pub mod provider_manager;
pub mod report;
pub mod settings;
pub mod snapshot;

pub use error::{ConfigError, ScaleError};
pub use project::{ClusterList, ProjectScaler};
pub use report::RunReport;
pub use snapshot::ClusterSnapshot;
