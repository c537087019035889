mod registry;

pub use registry::{ConnectionId, SubscriberRegistry};
