use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events. The loop asks for the next event with a
/// timeout; an expired wait yields Tick, which is also when the session
/// timer gets polled.
pub trait EventSource {
    fn next(&mut self, timeout: Duration) -> io::Result<AppEvent>;
}

/// Production source backed by crossterm's poll/read pair. No reader thread:
/// the poll timeout doubles as the tick interval.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next(&mut self, timeout: Duration) -> io::Result<AppEvent> {
        if event::poll(timeout)? {
            match event::read()? {
                CtEvent::Key(key) => Ok(AppEvent::Key(key)),
                CtEvent::Resize(_, _) => Ok(AppEvent::Resize),
                _ => Ok(AppEvent::Tick),
            }
        } else {
            Ok(AppEvent::Tick)
        }
    }
}

/// Scripted source for unit tests; yields Tick once the queue runs dry.
pub struct ScriptedEvents {
    queue: VecDeque<AppEvent>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = AppEvent>) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventSource for ScriptedEvents {
    fn next(&mut self, _timeout: Duration) -> io::Result<AppEvent> {
        Ok(self.queue.pop_front().unwrap_or(AppEvent::Tick))
    }
}
