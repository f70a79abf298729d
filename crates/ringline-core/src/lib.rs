pub mod batch;
pub mod config;
pub mod error;
pub mod phone;
pub mod traits;
pub mod types;
pub mod validation;

pub use batch::{summarize, BatchResult, BatchValidator, CsvRow, InvalidRow};
pub use config::Config;
pub use error::{Error, GatewayError};
pub use phone::{Normalizer, PhoneNumber};
pub use traits::ProviderGateway;
pub use types::{CallStatus, IssuedToken, TalkAction, Voice};
