//! Outbound adapters for external services.

pub mod clob;
pub mod ctf;
pub mod gamma;
pub mod openrouter;

pub use clob::ClobGateway;
pub use ctf::CtfChain;
pub use gamma::GammaCatalog;
pub use openrouter::OpenRouterOracle;
