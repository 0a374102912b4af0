//! Notifications a host sends to the bridge, and a small bus to deliver them.
//!
//! Events are plain data; listeners answer by mutating them. The bus calls
//! listeners in [`EventPriority`] order, lowest first, so a `Monitor`
//! listener sees the final state.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::completion::Completions;
use crate::descriptor::GrammarNode;
use crate::legacy::LegacyCommand;
use crate::source::Sender;

/// The host finished registering `command_label` and is about to expose
/// `literal` in its own command tree
pub struct CommandRegistered {
    pub command_label: String,
    pub command: Arc<dyn LegacyCommand>,
    pub literal: GrammarNode,
    /// Set when a listener installed a real grammar in place of the
    /// passthrough literal
    pub raw: bool,
    pub cancelled: bool,
}

impl fmt::Debug for CommandRegistered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistered")
            .field("command_label", &self.command_label)
            .field("literal", &self.literal.read().name())
            .field("raw", &self.raw)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl CommandRegistered {
    pub fn new(
        command_label: impl Into<String>,
        command: Arc<dyn LegacyCommand>,
        literal: GrammarNode,
    ) -> Self {
        Self {
            command_label: command_label.into(),
            command,
            literal,
            raw: false,
            cancelled: false,
        }
    }
}

/// A sender typed `buffer` and is waiting for completions
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub sender: Sender,
    pub buffer: String,
    pub suggestions: Option<Completions>,
    pub cancelled: bool,
}

impl SuggestionRequest {
    pub fn new(sender: Sender, buffer: impl Into<String>) -> Self {
        Self {
            sender,
            buffer: buffer.into(),
            suggestions: None,
            cancelled: false,
        }
    }
}

/// The host's general tab-complete path. `handled` may be set from another
/// task after the event has been delivered.
#[derive(Debug, Clone)]
pub struct TabComplete {
    pub sender: Sender,
    pub buffer: String,
    handled: Arc<AtomicBool>,
}

impl TabComplete {
    pub fn new(sender: Sender, buffer: impl Into<String>) -> Self {
        Self {
            sender,
            buffer: buffer.into(),
            handled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    pub fn set_handled(&self, handled: bool) {
        self.handled.store(handled, Ordering::Release);
    }

    /// Shared flag, for marking the event from a spawned task
    pub fn handled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.handled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventPriority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
    /// Observe only
    Monitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CommandRegistered,
    SuggestionRequest,
    TabComplete,
}

pub trait HostListener: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self, _kind: EventKind) -> EventPriority {
        EventPriority::Normal
    }

    fn on_command_registered(&self, _event: &mut CommandRegistered) {}

    fn on_suggestion_request(&self, _event: &mut SuggestionRequest) {}

    fn on_tab_complete(&self, _event: &TabComplete) {}
}

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn HostListener>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.listeners.iter().map(|l| l.name()).collect();
        f.debug_struct("EventBus").field("listeners", &names).finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn HostListener>) {
        self.listeners.push(listener);
    }

    fn ordered(&self, kind: EventKind) -> Vec<&Arc<dyn HostListener>> {
        let mut listeners: Vec<&Arc<dyn HostListener>> = self.listeners.iter().collect();
        // Stable, so equal priorities keep subscription order
        listeners.sort_by_key(|listener| listener.priority(kind));
        listeners
    }

    pub fn fire_command_registered(&self, event: &mut CommandRegistered) {
        for listener in self.ordered(EventKind::CommandRegistered) {
            listener.on_command_registered(event);
        }
    }

    pub fn fire_suggestion_request(&self, event: &mut SuggestionRequest) {
        for listener in self.ordered(EventKind::SuggestionRequest) {
            listener.on_suggestion_request(event);
        }
    }

    pub fn fire_tab_complete(&self, event: &TabComplete) {
        for listener in self.ordered(EventKind::TabComplete) {
            listener.on_tab_complete(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Named {
        name: &'static str,
        priority: EventPriority,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl HostListener for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self, _kind: EventKind) -> EventPriority {
            self.priority
        }

        fn on_suggestion_request(&self, event: &mut SuggestionRequest) {
            self.log.lock().unwrap().push(self.name);
            if self.priority == EventPriority::Monitor {
                assert!(event.cancelled);
            } else {
                event.cancelled = true;
            }
        }

        fn on_tab_complete(&self, event: &TabComplete) {
            self.log.lock().unwrap().push(self.name);
            event.set_handled(true);
        }
    }

    #[test]
    fn test_listeners_run_in_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        for (name, priority) in [
            ("monitor", EventPriority::Monitor),
            ("low", EventPriority::Low),
            ("normal-a", EventPriority::Normal),
            ("normal-b", EventPriority::Normal),
        ] {
            bus.subscribe(Arc::new(Named {
                name,
                priority,
                log: log.clone(),
            }));
        }

        let mut request = SuggestionRequest::new(Sender::console(), "/foo");
        bus.fire_suggestion_request(&mut request);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["low", "normal-a", "normal-b", "monitor"]
        );
    }

    #[test]
    fn test_tab_complete_flag_is_shared() {
        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(Named {
            name: "only",
            priority: EventPriority::Normal,
            log: Arc::new(Mutex::new(Vec::new())),
        }));

        let event = TabComplete::new(Sender::console(), "/fo");
        let copy = event.clone();
        bus.fire_tab_complete(&event);
        assert!(copy.is_handled());
    }
}
