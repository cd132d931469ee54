//! Realtime message payloads

mod payload;

pub use payload::{ChangeEvent, ChangeKind, ChangedEntity, EphemeralEvent, EphemeralKind};
