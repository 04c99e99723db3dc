//! SUBSCRIBE / UNSUBSCRIBE / PUBLISH and the subscribe-mode PING reply.

mod ping;
mod publish;
mod subscribe;

pub use ping::subscribe_ping;
pub use publish::publish;
pub use subscribe::{subscribe, unsubscribe};
