pub mod error;
pub mod events;
pub mod health;
pub mod rewrite;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod timeout;
pub mod tracing;
pub mod upstream;

pub use self::server::ProxyServer;
pub use self::tracing::init_tracing;
