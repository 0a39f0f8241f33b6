//! Message broker topology, consumption, and publishing for the
//! build-execution worker.

pub mod broker;
pub mod consumer;
pub mod error;
pub mod publisher;
pub mod sink;
pub mod topology;

pub use broker::Broker;
pub use consumer::JobDelivery;
pub use error::{BrokerError, BrokerResult};
pub use sink::{ChannelEventSink, EventSink};

#[cfg(test)]
mod tests {
    use crate::topology::logs_routing_key;

    #[test]
    fn logs_routing_key_is_scoped_to_build() {
        assert_eq!(logs_routing_key("abc-123"), "app.build.logs.abc-123");
    }
}
