//! Output side of the bridge: the datagram channel and the console gauge.

pub mod gauge;
pub mod publisher;

pub use gauge::{StressState, ZEN_THRESHOLD};
pub use publisher::{MetricPublisher, MetricReading, MetricSink, ReadingOrigin, UdpChannel};
