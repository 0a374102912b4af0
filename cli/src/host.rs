//! A minimal command host: a legacy command map, a host-side grammar tree
//! mirroring every known name, and the event bus the bridge listens on.

use std::sync::Arc;

use anyhow::Result;
use azalea_brigadier::prelude::{CommandDispatcher, argument, greedy_string, literal};
use cmdbridge_core::{
    BridgeConfig, CommandCtx, CommandRegistered, CommandRegistry, CommandSource, Completions,
    Descriptor, DispatchOutcome, EventBus, GrammarNode, HostListener, LegacyCommand,
    LegacyRegistry, Sender, SimpleCommandMap, SuggestionRequest, TabComplete, complete_input,
};
use parking_lot::RwLock;
use tracing::{debug, info};

pub struct Server {
    prefix: char,
    command_map: Arc<SimpleCommandMap>,
    registry: Arc<CommandRegistry>,
    events: EventBus,
    tree: CommandDispatcher<CommandSource>,
}

impl Server {
    pub fn new(config: BridgeConfig) -> Result<Self> {
        let prefix = config.command_prefix;
        let command_map = Arc::new(SimpleCommandMap::new());
        let registry = Arc::new(CommandRegistry::new(config, command_map.clone())?);

        let mut events = EventBus::new();
        events.subscribe(registry.clone() as Arc<dyn HostListener>);

        Ok(Self {
            prefix,
            command_map,
            registry,
            events,
            tree: CommandDispatcher::new(),
        })
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn register(&mut self, descriptor: Descriptor) -> bool {
        let registered = self.registry.register(Arc::new(descriptor));
        self.sync_commands();
        registered
    }

    pub fn unregister(&mut self, label: &str) -> bool {
        let Some(descriptor) = self.registry.find(label) else {
            return false;
        };
        let removed = self.registry.unregister(&descriptor);
        self.sync_commands();
        removed
    }

    /// Rebuild the host tree from the legacy map, letting listeners replace
    /// each passthrough node
    pub fn sync_commands(&mut self) {
        let mut known: Vec<_> = self.command_map.known_commands().into_iter().collect();
        known.sort_by(|a, b| a.0.cmp(&b.0));

        let tree = CommandDispatcher::new();
        for (name, command) in known {
            let mut event = CommandRegistered::new(name.clone(), command, passthrough(&name));
            self.events.fire_command_registered(&mut event);
            if event.cancelled {
                debug!("Registration of '{name}' was cancelled");
                continue;
            }
            tree.root.write().add_child(&event.literal);
        }
        self.tree = tree;
        info!("Synced {} command names", self.tree.root.read().children.len());
    }

    /// Run one line of input through the legacy map
    pub fn execute(&self, sender: &Sender, line: &str) -> DispatchOutcome {
        let line = line.trim();
        let line = line.strip_prefix(self.prefix).unwrap_or(line);
        self.command_map.dispatch(sender, line)
    }

    /// Completions for `buffer`, which starts with the command prefix
    pub fn complete(&self, sender: &Sender, buffer: &str) -> Completions {
        let tab = TabComplete::new(sender.clone(), buffer);
        self.events.fire_tab_complete(&tab);

        let mut request = SuggestionRequest::new(sender.clone(), buffer);
        self.events.fire_suggestion_request(&mut request);
        if let Some(suggestions) = request.suggestions
            && !request.cancelled
        {
            return suggestions;
        }

        // Not a bridged command; complete from the host tree instead
        let Some(input) = buffer.strip_prefix(self.prefix) else {
            return Completions::default();
        };
        let offset = buffer.len() - input.len();
        complete_input(&self.tree, input, CommandSource::new(sender.clone()))
            .rebased(0, offset)
            .anchored_at(buffer.len())
    }

    /// Usage of every bridged command the sender may run
    pub fn help(&self, sender: &Sender) -> Vec<String> {
        let source = CommandSource::new(sender.clone());
        self.registry
            .all()
            .iter()
            .filter(|descriptor| descriptor.shim().test_permission_silent(sender))
            .filter(|descriptor| (descriptor.tree().read().requirement)(&source))
            .map(|descriptor| descriptor.usage())
            .collect()
    }
}

/// The node a host builds for a legacy name before listeners see it: the name
/// followed by free text
fn passthrough(name: &str) -> GrammarNode {
    let node = literal(name)
        .executes(|_: &CommandCtx| 1)
        .then(argument("args", greedy_string()).executes(|_: &CommandCtx| 1))
        .build();
    Arc::new(RwLock::new(node))
}

#[cfg(test)]
mod tests {
    use cmdbridge_core::Location;

    use super::*;
    use crate::demo;

    fn server() -> Server {
        let mut server = Server::new(BridgeConfig::new("demo")).unwrap();
        for descriptor in demo::descriptors() {
            server.register(descriptor);
        }
        server
    }

    fn host_child(server: &Server, name: &str) -> Option<GrammarNode> {
        server.tree.root.read().children.get(name).cloned()
    }

    #[test]
    fn test_bridged_names_get_real_grammar() {
        let server = server();
        let greet = host_child(&server, "greet").unwrap();
        assert!(greet.read().children.contains_key("name"));
        assert!(!greet.read().children.contains_key("args"));

        let namespaced = host_child(&server, "demo:hi").unwrap();
        assert!(namespaced.read().children.contains_key("name"));
    }

    #[test]
    fn test_foreign_names_keep_passthrough() {
        let mut server = server();
        let foreign = Descriptor::new("legacy");
        server
            .command_map
            .register("other", Arc::clone(foreign.shim()) as Arc<dyn LegacyCommand>);
        server.sync_commands();

        let node = host_child(&server, "legacy").unwrap();
        assert!(node.read().children.contains_key("args"));
    }

    #[test]
    fn test_execute_strips_prefix() {
        let server = server();
        let sender = Sender::console();
        assert_eq!(
            server.execute(&sender, "/greet Steve"),
            DispatchOutcome::Completed { success: true }
        );
        assert_eq!(sender.take_messages(), vec!["Hello, Steve!"]);
    }

    #[test]
    fn test_complete_bridged_command() {
        let server = server();
        let suggestions = server.complete(&Sender::console(), "/counter ");
        assert_eq!(suggestions.texts(), vec!["add", "reset", "show"]);
        assert_eq!(suggestions.range, 9..9);
    }

    #[test]
    fn test_complete_command_names_from_host_tree() {
        let server = server();
        let suggestions = server.complete(&Sender::console(), "/gr");
        assert_eq!(suggestions.texts(), vec!["greet"]);
        assert_eq!(suggestions.list[0].range, 1..3);
    }

    #[test]
    fn test_help_respects_requirements() {
        let server = server();
        let console = server.help(&Sender::console());
        assert!(console.iter().any(|line| line == "/counter <add <amount>|show|reset>"));
        assert!(!console.iter().any(|line| line.starts_with("/teleport")));

        let player = server.help(&Sender::player("alex", "world", Location::default()));
        assert!(player.iter().any(|line| line == "/teleport <x> <y> <z>"));
        assert!(!player.iter().any(|line| line.starts_with("/echo")));
    }

    #[test]
    fn test_unregister_drops_names() {
        let mut server = server();
        assert!(server.unregister("greet"));
        assert!(host_child(&server, "greet").is_none());
        assert!(host_child(&server, "hi").is_none());
        assert_eq!(
            server.execute(&Sender::console(), "greet Steve"),
            DispatchOutcome::UnknownCommand
        );
        assert!(!server.unregister("greet"));
    }
}
