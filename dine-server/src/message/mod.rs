//! Realtime fan-out layer

mod bus;

pub use bus::MessageBus;
