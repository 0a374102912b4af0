//! The facade a plugin talks to: tracks descriptors, mirrors them into the
//! legacy registry and answers the host's registration and completion
//! notifications.
//!
//! `register` and `unregister` are expected from a single host thread. The
//! event handlers only read the tracked set and may run concurrently with
//! each other.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::completion::{Completions, complete_input};
use crate::config::BridgeConfig;
use crate::descriptor::{Descriptor, DescriptorId};
use crate::error::BridgeResult;
use crate::events::{
    CommandRegistered, EventKind, EventPriority, HostListener, SuggestionRequest, TabComplete,
};
use crate::legacy::{LegacyCommand, LegacyRegistry};
use crate::redirect::build_redirect;
use crate::source::CommandSource;

/// Every name a descriptor is known by: label, `namespace:label`, then each
/// alias and `namespace:alias`, all lowercased and trimmed
pub fn all_labels(namespace: &str, descriptor: &Descriptor) -> Vec<String> {
    std::iter::once(descriptor.label())
        .chain(descriptor.aliases().iter().map(String::as_str))
        .map(|name| name.trim().to_lowercase())
        .flat_map(|name| {
            let namespaced = format!("{namespace}:{name}");
            [name, namespaced]
        })
        .collect()
}

pub struct CommandRegistry {
    namespace: String,
    listener_name: String,
    config: BridgeConfig,
    legacy: Arc<dyn LegacyRegistry>,
    commands: RwLock<Vec<Arc<Descriptor>>>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("namespace", &self.namespace)
            .field("commands", &self.read().len())
            .finish()
    }
}

impl CommandRegistry {
    pub fn new(config: BridgeConfig, legacy: Arc<dyn LegacyRegistry>) -> BridgeResult<Self> {
        let namespace = config.normalized_namespace()?;
        Ok(Self {
            listener_name: format!("cmdbridge:{namespace}"),
            namespace,
            config,
            legacy,
            commands: RwLock::new(Vec::new()),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<Descriptor>>> {
        self.commands.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<Descriptor>>> {
        self.commands.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Track `descriptor` and hand its shim to the legacy registry.
    ///
    /// Returns false without side effects if this descriptor is already
    /// tracked. Otherwise returns whether the legacy registry claimed the bare
    /// label; the descriptor stays tracked either way.
    pub fn register(&self, descriptor: Arc<Descriptor>) -> bool {
        {
            let mut commands = self.write();
            if commands.iter().any(|tracked| tracked.id() == descriptor.id()) {
                debug!("Descriptor '{}' is already registered", descriptor.label());
                return false;
            }
            commands.push(Arc::clone(&descriptor));
        }

        let shim: Arc<dyn LegacyCommand> = Arc::clone(descriptor.shim()) as Arc<dyn LegacyCommand>;
        let registered = self.legacy.register(&self.namespace, shim);
        debug!(
            "Registered '{}' under '{}' (label claimed: {registered})",
            descriptor.label(),
            self.namespace
        );
        registered
    }

    pub fn unregister(&self, descriptor: &Arc<Descriptor>) -> bool {
        self.unregister_by_id(descriptor.id())
    }

    /// Stop tracking a descriptor and remove its names from the legacy
    /// registry.
    ///
    /// Only names still pointing at this descriptor's shim are removed. Hosts
    /// that cache their own command tree may keep answering to the names
    /// until they resync.
    pub fn unregister_by_id(&self, id: DescriptorId) -> bool {
        let removed = {
            let mut commands = self.write();
            let Some(index) = commands.iter().position(|tracked| tracked.id() == id) else {
                return false;
            };
            commands.remove(index)
        };

        let shim = removed.shim();
        for name in all_labels(&self.namespace, &removed) {
            let owned = self
                .legacy
                .command(&name)
                .is_some_and(|command| std::ptr::addr_eq(Arc::as_ptr(&command), Arc::as_ptr(shim)));
            if owned && self.legacy.remove_known(&name) {
                debug!("Removed legacy name '{name}'");
            }
        }
        warn!(
            "Unregistered '{}'; the host may keep stale entries for it",
            removed.label()
        );
        true
    }

    /// Snapshot of the tracked descriptors in registration order
    pub fn all(&self) -> Vec<Arc<Descriptor>> {
        self.read().clone()
    }

    /// The tracked descriptor with this label, ignoring case
    pub fn find(&self, label: &str) -> Option<Arc<Descriptor>> {
        let label = label.trim().to_lowercase();
        self.read()
            .iter()
            .find(|descriptor| descriptor.label() == label)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn all_labels(&self, descriptor: &Descriptor) -> Vec<String> {
        all_labels(&self.namespace, descriptor)
    }

    /// Swap the host's passthrough literal for a redirect into the real tree
    pub fn on_command_registered(&self, event: &mut CommandRegistered) {
        let Some(descriptor) = self.find(event.command.label()) else {
            return;
        };
        event.raw = true;
        event.literal = build_redirect(&event.command_label, descriptor.tree());
        debug!(
            "Installed grammar of '{}' as '{}'",
            descriptor.label(),
            event.command_label
        );
    }

    /// Complete `event.buffer` from the matching descriptor's grammar, or mark
    /// the request cancelled. A panic while computing completions cancels the
    /// request instead of reaching the host.
    pub fn on_suggestion_request(&self, event: &mut SuggestionRequest) {
        match catch_unwind(AssertUnwindSafe(|| self.suggest(event))) {
            Ok(Some(suggestions)) => event.suggestions = Some(suggestions),
            Ok(None) => {
                debug!("No bridged command for '{}'", event.buffer);
                event.cancelled = true;
            }
            Err(_) => {
                warn!("Computing completions for '{}' panicked", event.buffer);
                event.cancelled = true;
            }
        }
    }

    fn suggest(&self, event: &SuggestionRequest) -> Option<Completions> {
        let buffer = event.buffer.as_str();
        let first = buffer.split(' ').next().unwrap_or_default();
        let name = first.strip_prefix(self.config.command_prefix)?;
        let label = self.legacy.command(name)?.label().to_string();
        let descriptor = self.find(&label)?;

        let rest = buffer.get(first.len()..).unwrap_or_default();
        let input = format!("{label}{rest}");
        let source = CommandSource::new(event.sender.clone());
        // Ranges come back relative to `input`; move them onto the typed buffer
        let completions = complete_input(descriptor.dispatcher(), &input, source)
            .rebased(label.len(), first.len())
            .anchored_at(buffer.len());
        Some(completions)
    }

    /// Mark the host's tab-complete as handled from a background task
    pub fn on_tab_complete(&self, event: &TabComplete) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let flag = event.handled_flag();
                handle.spawn(async move {
                    flag.store(true, std::sync::atomic::Ordering::Release);
                });
            }
            Err(_) => event.set_handled(true),
        }
    }
}

impl HostListener for CommandRegistry {
    fn name(&self) -> &str {
        &self.listener_name
    }

    fn priority(&self, kind: EventKind) -> EventPriority {
        match kind {
            EventKind::TabComplete => EventPriority::Monitor,
            EventKind::CommandRegistered | EventKind::SuggestionRequest => EventPriority::Normal,
        }
    }

    fn on_command_registered(&self, event: &mut CommandRegistered) {
        CommandRegistry::on_command_registered(self, event);
    }

    fn on_suggestion_request(&self, event: &mut SuggestionRequest) {
        CommandRegistry::on_suggestion_request(self, event);
    }

    fn on_tab_complete(&self, event: &TabComplete) {
        CommandRegistry::on_tab_complete(self, event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use azalea_brigadier::prelude::{argument, integer, literal};

    use super::*;
    use crate::descriptor::CommandCtx;
    use crate::events::EventBus;
    use crate::legacy::SimpleCommandMap;
    use crate::source::Sender;

    fn registry() -> (Arc<SimpleCommandMap>, CommandRegistry) {
        let map = Arc::new(SimpleCommandMap::new());
        let registry = CommandRegistry::new(BridgeConfig::new("Plugin"), map.clone()).unwrap();
        (map, registry)
    }

    fn foo() -> Arc<Descriptor> {
        Arc::new(
            Descriptor::builder("foo")
                .aliases(["bar"])
                .logic(|root| {
                    root.then(literal("list").executes(|_: &CommandCtx| 1))
                        .then(literal("lock").executes(|_: &CommandCtx| 1))
                        .then(argument("n", integer()).executes(|_: &CommandCtx| 1))
                })
                .build(),
        )
    }

    fn owned_by(map: &SimpleCommandMap, name: &str, descriptor: &Descriptor) -> bool {
        map.command(name).is_some_and(|command| {
            std::ptr::addr_eq(Arc::as_ptr(&command), Arc::as_ptr(descriptor.shim()))
        })
    }

    #[test]
    fn test_namespace_is_normalized() {
        let (_, registry) = registry();
        assert_eq!(registry.namespace(), "plugin");
        assert_eq!(registry.name(), "cmdbridge:plugin");
    }

    #[test]
    fn test_invalid_namespace_is_rejected() {
        let map = Arc::new(SimpleCommandMap::new());
        assert!(CommandRegistry::new(BridgeConfig::new("a:b"), map).is_err());
    }

    #[test]
    fn test_all_labels_order() {
        let descriptor = Descriptor::builder("Foo").aliases([" Bar ", "BAZ"]).build();
        assert_eq!(
            all_labels("plugin", &descriptor),
            vec!["foo", "plugin:foo", "bar", "plugin:bar", "baz", "plugin:baz"]
        );
    }

    #[test]
    fn test_unregister_removes_padded_alias() {
        let (map, registry) = registry();
        let descriptor = Arc::new(Descriptor::builder("foo").aliases([" Bar "]).build());
        registry.register(descriptor.clone());
        assert!(map.command("plugin:bar").is_some());

        assert!(registry.unregister(&descriptor));
        assert!(map.known_commands().is_empty());
    }

    #[test]
    fn test_find_ignores_case() {
        let (_, registry) = registry();
        registry.register(foo());
        assert!(registry.find("FOO").is_some());
        assert!(registry.find("bar").is_none());
    }

    #[test]
    fn test_label_collision_still_tracks() {
        let (_, registry) = registry();
        assert!(registry.register(foo()));
        assert!(!registry.register(foo()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_leaves_other_owner() {
        let (map, registry) = registry();
        let first = foo();
        let second = foo();
        registry.register(first.clone());
        registry.register(second.clone());

        assert!(registry.unregister(&second));
        assert!(owned_by(&map, "foo", &first));
        assert!(map.command("plugin:foo").is_none());
    }

    #[test]
    fn test_dropped_alias_returns_after_reregister() {
        let (map, registry) = registry();
        let squatter = Arc::new(Descriptor::new("bar"));
        let descriptor = foo();
        registry.register(squatter.clone());
        registry.register(descriptor.clone());
        assert!(owned_by(&map, "bar", &squatter));
        assert!(descriptor.shim().aliases().is_empty());

        registry.unregister(&squatter);
        registry.unregister(&descriptor);
        registry.register(descriptor.clone());

        assert!(owned_by(&map, "bar", &descriptor));
        assert_eq!(descriptor.shim().aliases(), vec!["bar"]);
    }

    #[test]
    fn test_command_registered_installs_redirect() {
        let (map, registry) = registry();
        let descriptor = foo();
        registry.register(descriptor.clone());

        let command = map.command("plugin:bar").unwrap();
        let passthrough = Arc::new(parking_lot::RwLock::new(literal("plugin:bar").build()));
        let mut event = CommandRegistered::new("plugin:bar", command, passthrough);
        registry.on_command_registered(&mut event);

        assert!(event.raw);
        let literal = event.literal.read();
        assert_eq!(literal.name(), "plugin:bar");
        assert!(literal.children.contains_key("list"));
        assert!(Arc::ptr_eq(
            literal.children.get("n").unwrap(),
            descriptor.tree().read().children.get("n").unwrap()
        ));
    }

    #[test]
    fn test_command_registered_ignores_foreign_command() {
        let (map, registry) = registry();
        map.register("other", Arc::clone(Descriptor::new("other").shim()) as Arc<dyn LegacyCommand>);

        let command = map.command("other").unwrap();
        let passthrough = Arc::new(parking_lot::RwLock::new(literal("other").build()));
        let mut event = CommandRegistered::new("other", command, Arc::clone(&passthrough));
        registry.on_command_registered(&mut event);

        assert!(!event.raw);
        assert!(Arc::ptr_eq(&event.literal, &passthrough));
    }

    #[test]
    fn test_suggestions_through_alias_are_rebased() {
        let (_, registry) = registry();
        registry.register(foo());

        let mut request = SuggestionRequest::new(Sender::console(), "/bar l");
        registry.on_suggestion_request(&mut request);

        assert!(!request.cancelled);
        let suggestions = request.suggestions.unwrap();
        assert_eq!(suggestions.range, 6..6);
        assert_eq!(suggestions.texts(), vec!["list", "lock"]);
        assert_eq!(suggestions.list[0].range, 5..6);
    }

    #[test]
    fn test_suggestion_without_prefix_is_cancelled() {
        let (_, registry) = registry();
        registry.register(foo());

        let mut request = SuggestionRequest::new(Sender::console(), "foo l");
        registry.on_suggestion_request(&mut request);
        assert!(request.cancelled);
        assert!(request.suggestions.is_none());
    }

    #[test]
    fn test_panicking_grammar_cancels_suggestions() {
        let (_, registry) = registry();
        let broken = Descriptor::builder("broken")
            .logic(|root| {
                root.then(
                    literal("a")
                        .requires(|_: &CommandSource| panic!("lookup failed"))
                        .executes(|_: &CommandCtx| 1),
                )
            })
            .build();
        registry.register(Arc::new(broken));

        let mut request = SuggestionRequest::new(Sender::console(), "/broken a");
        registry.on_suggestion_request(&mut request);
        assert!(request.cancelled);
        assert!(request.suggestions.is_none());
    }

    #[test]
    fn test_tab_complete_without_runtime_is_marked_inline() {
        let (_, registry) = registry();
        let event = TabComplete::new(Sender::console(), "/foo");
        registry.on_tab_complete(&event);
        assert!(event.is_handled());
    }

    struct Watcher {
        seen_handled: Arc<Mutex<Option<bool>>>,
    }

    impl HostListener for Watcher {
        fn name(&self) -> &str {
            "watcher"
        }

        fn on_tab_complete(&self, event: &TabComplete) {
            *self.seen_handled.lock().unwrap() = Some(event.is_handled());
        }
    }

    #[test]
    fn test_registry_observes_tab_complete_last() {
        let (_, registry) = registry();
        assert_eq!(registry.priority(EventKind::TabComplete), EventPriority::Monitor);

        let seen_handled = Arc::new(Mutex::new(None));
        let mut bus = EventBus::new();
        bus.subscribe(Arc::new(registry));
        bus.subscribe(Arc::new(Watcher {
            seen_handled: seen_handled.clone(),
        }));

        let event = TabComplete::new(Sender::console(), "/foo");
        bus.fire_tab_complete(&event);

        // The normal listener ran before the registry marked the event
        assert_eq!(*seen_handled.lock().unwrap(), Some(false));
        assert!(event.is_handled());
    }
}
