pub mod audit;
pub mod config;
pub mod drift;
pub mod error;
pub mod eth;
pub mod personas;
pub mod types;

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use eth::client::PredictionClient;
