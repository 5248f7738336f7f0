mod loader;

pub use loader::{ClassifierConfig, Config, ReportConfig};
