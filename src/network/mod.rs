pub mod builder;
pub mod config;
pub mod event;
pub mod network;
pub mod ops;

pub use builder::NetworkBuilder;
pub use config::NetworkConfig;
pub use event::NetworkEvent;
pub use network::Network;
