//! Metric publishing: datagram channel plus console gauge.
//!
//! Publishing never fails from the caller's point of view. A send error is
//! logged and counted, and the pipeline carries on whether or not anything is
//! listening on the other end.

use crate::config::OutputConfig;
use crate::output::gauge;
use crate::session::SharedSessionStats;
use std::io::{self, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};

/// Where a metric came from; only affects console rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingOrigin {
    /// Derived from buffered ECG by the extractor.
    Sensor,
    /// Synthesised from click density.
    Simulated { clicks: usize },
}

/// One metric ready for publishing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricReading {
    /// RMSSD in milliseconds
    pub value: f64,
    pub origin: ReadingOrigin,
}

impl MetricReading {
    /// Reading derived from ECG.
    pub fn sensor(value: f64) -> Self {
        Self {
            value,
            origin: ReadingOrigin::Sensor,
        }
    }

    /// Reading synthesised from `clicks` presses.
    pub fn simulated(value: f64, clicks: usize) -> Self {
        Self {
            value,
            origin: ReadingOrigin::Simulated { clicks },
        }
    }

    /// UTF-8 decimal text sent over the wire.
    pub fn payload(&self) -> String {
        self.value.to_string()
    }
}

/// Anything that accepts metrics.
pub trait MetricSink {
    fn publish(&mut self, reading: &MetricReading);
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn publish(&mut self, reading: &MetricReading) {
        (**self).publish(reading);
    }
}

/// Connectionless one-way sender to a fixed destination.
#[derive(Debug)]
pub struct UdpChannel {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl UdpChannel {
    /// Resolve the destination and bind an ephemeral local socket of the
    /// matching address family.
    pub fn open(output: &OutputConfig) -> io::Result<Self> {
        let destination = (output.host.as_str(), output.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::AddrNotAvailable,
                    format!("could not resolve {}", output.destination()),
                )
            })?;

        let local = if destination.is_ipv6() {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)?;

        Ok(Self {
            socket,
            destination,
        })
    }

    /// Get the resolved destination address.
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Send one datagram.
    pub fn send(&self, payload: &str) -> io::Result<()> {
        self.socket.send_to(payload.as_bytes(), self.destination)?;
        Ok(())
    }
}

/// Sends each metric over UDP and renders it on the console.
pub struct MetricPublisher<W: Write = io::Stdout> {
    channel: UdpChannel,
    console: Option<W>,
    stats: SharedSessionStats,
}

impl MetricPublisher<io::Stdout> {
    /// Publisher that renders to stdout.
    pub fn new(channel: UdpChannel, stats: SharedSessionStats) -> Self {
        Self::with_console(channel, io::stdout(), stats)
    }
}

impl<W: Write> MetricPublisher<W> {
    /// Publisher that renders to `console`.
    pub fn with_console(channel: UdpChannel, console: W, stats: SharedSessionStats) -> Self {
        Self {
            channel,
            console: Some(console),
            stats,
        }
    }

    /// Publisher without a console gauge.
    pub fn quiet(channel: UdpChannel, stats: SharedSessionStats) -> Self {
        Self {
            channel,
            console: None,
            stats,
        }
    }

    /// Get the console writer, if any.
    pub fn console(&self) -> Option<&W> {
        self.console.as_ref()
    }

    fn render(&mut self, reading: &MetricReading) {
        let Some(console) = self.console.as_mut() else {
            return;
        };

        let written = match reading.origin {
            ReadingOrigin::Sensor => writeln!(console, "{}", gauge::sensor_line(reading.value)),
            ReadingOrigin::Simulated { clicks } => {
                write!(console, "\r{}", gauge::click_line(clicks, reading.value))
            }
        };
        if let Err(e) = written.and_then(|_| console.flush()) {
            tracing::debug!(error = %e, "console write failed");
        }
    }
}

impl<W: Write> MetricSink for MetricPublisher<W> {
    fn publish(&mut self, reading: &MetricReading) {
        self.render(reading);

        match self.channel.send(&reading.payload()) {
            Ok(()) => self.stats.record_published(),
            Err(e) => {
                self.stats.record_send_failure();
                tracing::warn!(
                    destination = %self.channel.destination(),
                    error = %e,
                    "failed to send metric"
                );
            }
        }
    }
}
