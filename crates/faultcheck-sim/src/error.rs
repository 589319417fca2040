use faultcheck_e2e::E2eError;
use faultcheck_packet::plan::PlanError;
use faultcheck_packet::FaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config version {0}")]
    Version(u32),
    #[error("channel: {0}")]
    Channel(String),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    E2e(#[from] E2eError),
    #[error(transparent)]
    Fault(#[from] FaultError),
}
