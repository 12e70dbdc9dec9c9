pub mod attention;
pub mod backend;
pub mod config;
pub mod drafts;
pub mod logging;
pub mod model;
pub mod nav;
pub mod scan;
pub mod session;
pub mod util;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use session::{DocumentSession, SaveOutcome};
