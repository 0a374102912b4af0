//! The flat, name-indexed command table that predates tree-based parsing.
//!
//! [`LegacyRegistry`] is the contract the bridge consumes. [`SimpleCommandMap`]
//! is an in-memory implementation with the usual collision rules:
//!
//! - `namespace:label` and `namespace:alias` are always written
//! - a bare label fails when another command already owns it as its label
//! - an alias never overwrites an existing entry
//! - aliases that fail to register are dropped from the command's active list
//!   and tried again on the next registration

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::source::Sender;

pub const DEFAULT_PERMISSION_MESSAGE: &str =
    "You do not have permission to perform this command.";

/// A command as the legacy registry sees it: a name, some metadata and a
/// boolean-result `execute`.
pub trait LegacyCommand: Send + Sync {
    fn label(&self) -> &str;

    /// Aliases currently answering for this command
    fn aliases(&self) -> Vec<String>;

    /// Aliases to try on each registration, including ones an earlier
    /// registration had to drop
    fn configured_aliases(&self) -> Vec<String> {
        self.aliases()
    }

    fn description(&self) -> &str;

    fn usage(&self) -> &str;

    fn permission(&self) -> Option<&str>;

    fn permission_message(&self) -> Option<&str>;

    /// Run the command. `label` is the name the sender typed and `args` the
    /// remaining space-separated words.
    fn execute(&self, sender: &Sender, label: &str, args: &[String]) -> bool;

    /// Called by the registry with the aliases that were actually registered
    fn set_active_aliases(&self, _aliases: Vec<String>) {}

    /// Whether `sender` holds any of the `;`-separated permission nodes
    fn test_permission_silent(&self, sender: &Sender) -> bool {
        match self.permission() {
            None => true,
            Some(permission) if permission.trim().is_empty() => true,
            Some(permission) => permission
                .split(';')
                .map(str::trim)
                .any(|node| sender.has_permission(node)),
        }
    }

    /// Like [`test_permission_silent`](Self::test_permission_silent), but tells
    /// the sender when they are refused
    fn test_permission(&self, sender: &Sender) -> bool {
        if self.test_permission_silent(sender) {
            return true;
        }
        match self.permission_message() {
            Some(message) if message.is_empty() => {}
            Some(message) => sender.send_message(message),
            None => sender.send_message(DEFAULT_PERMISSION_MESSAGE),
        }
        false
    }
}

pub trait LegacyRegistry: Send + Sync {
    /// Register under the bare label, `namespace:label` and every alias.
    /// Returns whether the bare label was claimed.
    fn register(&self, namespace: &str, command: Arc<dyn LegacyCommand>) -> bool;

    /// Resolve a typed name to its command
    fn command(&self, name: &str) -> Option<Arc<dyn LegacyCommand>>;

    /// Snapshot of every name the registry answers to
    fn known_commands(&self) -> HashMap<String, Arc<dyn LegacyCommand>>;

    /// Drop one name from the lookup table
    fn remove_known(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    UnknownCommand,
    PermissionDenied,
    Completed { success: bool },
}

#[derive(Default)]
pub struct SimpleCommandMap {
    known: RwLock<HashMap<String, Arc<dyn LegacyCommand>>>,
}

impl std::fmt::Debug for SimpleCommandMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let known = self.known.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&String> = known.keys().collect();
        names.sort();
        f.debug_struct("SimpleCommandMap")
            .field("known", &names)
            .finish()
    }
}

impl SimpleCommandMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `line` on spaces and run the command named by the first word
    pub fn dispatch(&self, sender: &Sender, line: &str) -> DispatchOutcome {
        let mut words = line.split(' ');
        let label = words.next().unwrap_or_default().to_lowercase();
        let args: Vec<String> = words.map(str::to_string).collect();

        let Some(command) = self.command(&label) else {
            debug!("Unknown command '{label}' from {}", sender.name());
            return DispatchOutcome::UnknownCommand;
        };
        if !command.test_permission(sender) {
            debug!("{} lacks permission for '{label}'", sender.name());
            return DispatchOutcome::PermissionDenied;
        }

        let success = command.execute(sender, &label, &args);
        DispatchOutcome::Completed { success }
    }

    fn register_name(
        known: &mut HashMap<String, Arc<dyn LegacyCommand>>,
        name: &str,
        namespace: &str,
        command: &Arc<dyn LegacyCommand>,
        is_alias: bool,
    ) -> bool {
        known.insert(format!("{namespace}:{name}"), Arc::clone(command));

        if is_alias && known.contains_key(name) {
            return false;
        }
        if let Some(conflict) = known.get(name)
            && conflict.label() == name
        {
            return false;
        }

        known.insert(name.to_string(), Arc::clone(command));
        true
    }
}

impl LegacyRegistry for SimpleCommandMap {
    fn register(&self, namespace: &str, command: Arc<dyn LegacyCommand>) -> bool {
        let namespace = namespace.trim().to_lowercase();
        let label = command.label().trim().to_lowercase();
        let mut known = self.known.write().unwrap_or_else(PoisonError::into_inner);

        let registered = Self::register_name(&mut known, &label, &namespace, &command, false);
        if !registered {
            warn!("Command name '{label}' is taken; only '{namespace}:{label}' was registered");
        }

        let mut active = Vec::new();
        for alias in command.configured_aliases() {
            let alias = alias.trim().to_lowercase();
            if Self::register_name(&mut known, &alias, &namespace, &command, true) {
                active.push(alias);
            } else {
                warn!("Alias '{alias}' of '{label}' is taken; dropping it");
            }
        }
        drop(known);
        command.set_active_aliases(active);

        registered
    }

    fn command(&self, name: &str) -> Option<Arc<dyn LegacyCommand>> {
        self.known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&name.trim().to_lowercase())
            .cloned()
    }

    fn known_commands(&self) -> HashMap<String, Arc<dyn LegacyCommand>> {
        self.known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remove_known(&self, name: &str) -> bool {
        self.known
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }
}
