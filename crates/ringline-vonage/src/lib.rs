pub mod gateway;
pub mod token;

pub use gateway::VonageGateway;
pub use token::Claims;
