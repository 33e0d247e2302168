//! IO layer - backend HTTP client, egress channel, journal, location sources

pub mod backend;
pub mod egress_channel;
pub mod journal;
pub mod locate;
pub mod publisher;

pub use backend::BackendClient;
pub use egress_channel::{
    create_egress_channel, AlertPayload, AlertReason, EgressMessage, EgressSender,
    NavProgressPayload, ZoneEventPayload,
};
pub use journal::EventJournal;
pub use locate::{LocationSource, ReplaySource, StaticSource};
pub use publisher::BackendPublisher;
