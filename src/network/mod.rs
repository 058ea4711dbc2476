//! TCP messaging layer: wire framing, connection pooling and the hub.

pub(crate) mod frame;
pub mod hub;
pub(crate) mod pool;

pub use hub::MsgHub;
