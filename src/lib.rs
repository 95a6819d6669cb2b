pub mod cli;
pub mod config;
pub mod dataset;
pub mod estimate;
pub mod geometry;
pub mod parser;
pub mod scenario;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use dataset::{load_dashboard, Dashboard};
pub use scenario::{ReassignPolicy, Scenario};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui, UiApp};
