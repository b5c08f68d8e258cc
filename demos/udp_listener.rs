//! Minimal consumer of the bridge's datagrams.
//!
//! Binds the configured destination port and prints every metric it
//! receives together with the STRESS/ZEN reading a downstream app would
//! derive from it. Datagrams that are not a UTF-8 decimal number are
//! reported and skipped.
//!
//! Run with: cargo run --example udp_listener
//!
//! Then start the bridge in another terminal: cargo run -- run --mode sim

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use synheart_ecg_bridge::{config::Config, output::gauge, StressState};

fn main() {
    println!("Synheart ECG Bridge - UDP Listener");
    println!("==================================");
    println!();

    let config = Config::load().unwrap_or_default();
    let bind_addr = format!("0.0.0.0:{}", config.output.port);

    let socket = match UdpSocket::bind(&bind_addr) {
        Ok(socket) => socket,
        Err(e) => {
            eprintln!("Could not bind {bind_addr}: {e}");
            std::process::exit(1);
        }
    };
    // Short timeout so Ctrl+C is noticed promptly
    if let Err(e) = socket.set_read_timeout(Some(Duration::from_millis(500))) {
        eprintln!("Could not set read timeout: {e}");
        std::process::exit(1);
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || r.store(false, Ordering::SeqCst))
        .expect("Error setting Ctrl+C handler");

    println!("Listening on {bind_addr}. Press Ctrl+C to stop.");
    println!();

    let mut buf = [0u8; 256];
    let mut received = 0u64;
    let mut malformed = 0u64;

    while running.load(Ordering::SeqCst) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(datagram) => datagram,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                continue
            }
            Err(e) => {
                eprintln!("Receive failed: {e}");
                break;
            }
        };

        let Some(metric) = parse_metric(&buf[..len]) else {
            malformed += 1;
            eprintln!("Ignoring malformed datagram from {from} ({len} bytes)");
            continue;
        };
        received += 1;

        let state = StressState::from_metric(metric);
        println!(
            "{from} -> {metric:7.2} ms | {:6} | {}",
            state.label(),
            gauge::bar(metric)
        );
    }

    println!();
    println!("Received {received} metrics ({malformed} malformed).");
}

fn parse_metric(payload: &[u8]) -> Option<f64> {
    std::str::from_utf8(payload)
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
