//! Trigger key polling for the click simulator.
//!
//! The simulator only ever asks one question, "was the key pressed since I
//! last looked?", and must get an answer immediately. [`TerminalTrigger`]
//! reads the terminal in raw mode on a background thread and queues presses
//! on a channel; polling just drains that channel.

use crate::shutdown::Shutdown;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the reader thread blocks waiting for a terminal event.
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Presses queued beyond this are dropped; the debounce would discard them anyway.
const PRESS_QUEUE_CAPACITY: usize = 64;

/// Non-blocking "is the trigger key pressed" query.
pub trait TriggerKey {
    fn is_pressed(&mut self) -> bool;
}

impl<T: TriggerKey + ?Sized> TriggerKey for Box<T> {
    fn is_pressed(&mut self) -> bool {
        (**self).is_pressed()
    }
}

/// A trigger that is never pressed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrigger;

impl TriggerKey for NoopTrigger {
    fn is_pressed(&mut self) -> bool {
        false
    }
}

/// Trigger fed by presses sent on a channel.
#[derive(Debug, Clone)]
pub struct ChannelTrigger {
    presses: Receiver<()>,
}

impl ChannelTrigger {
    /// Trigger fed by `presses`.
    pub fn new(presses: Receiver<()>) -> Self {
        Self { presses }
    }

    /// Trigger plus the sender that presses it.
    pub fn pair() -> (Sender<()>, Self) {
        let (tx, rx) = bounded(PRESS_QUEUE_CAPACITY);
        (tx, Self::new(rx))
    }
}

impl TriggerKey for ChannelTrigger {
    fn is_pressed(&mut self) -> bool {
        // Collapse everything queued since the last poll into one press
        let mut pressed = false;
        while self.presses.try_recv().is_ok() {
            pressed = true;
        }
        pressed
    }
}

/// Space bar in a raw-mode terminal.
pub struct TerminalTrigger {
    inner: ChannelTrigger,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl TerminalTrigger {
    /// Enter raw mode and start the reader thread.
    ///
    /// Raw mode swallows Ctrl+C as a signal, so the reader raises
    /// `shutdown` itself when it sees the key combination.
    pub fn spawn(shutdown: Shutdown) -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;

        let (sender, inner) = ChannelTrigger::pair();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let handle = thread::Builder::new()
            .name("trigger-key".to_string())
            .spawn(move || read_keys(sender, thread_running, shutdown));

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                let _ = crossterm::terminal::disable_raw_mode();
                return Err(e);
            }
        };

        Ok(Self {
            inner,
            running,
            thread_handle: Some(handle),
        })
    }
}

impl TriggerKey for TerminalTrigger {
    fn is_pressed(&mut self) -> bool {
        self.inner.is_pressed()
    }
}

impl Drop for TerminalTrigger {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            // Exits within one poll interval
            let _ = handle.join();
        }
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "failed to restore terminal mode");
        }
    }
}

fn read_keys(sender: Sender<()>, running: Arc<AtomicBool>, shutdown: Shutdown) {
    while running.load(Ordering::SeqCst) {
        match event::poll(EVENT_POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                tracing::error!(error = %e, "terminal event poll failed");
                break;
            }
        }

        let key = match event::read() {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(error = %e, "terminal event read failed");
                break;
            }
        };

        match classify(&key) {
            KeyAction::Press => match sender.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => break,
            },
            KeyAction::Interrupt => shutdown.request(),
            KeyAction::Ignore => {}
        }
    }
    running.store(false, Ordering::SeqCst);
}

#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    Press,
    Interrupt,
    Ignore,
}

fn classify(key: &KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Interrupt
        }
        KeyCode::Char(' ') if key.kind != KeyEventKind::Release => KeyAction::Press,
        _ => KeyAction::Ignore,
    }
}
