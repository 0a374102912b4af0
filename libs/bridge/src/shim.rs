//! The legacy-registry face of a [`Descriptor`].

use std::sync::{Arc, PoisonError, RwLock};

use azalea_brigadier::prelude::CommandDispatcher;
use azalea_brigadier::string_reader::StringReader;
use tracing::debug;

use crate::descriptor::{Descriptor, SyntaxErrorHandler};
use crate::legacy::LegacyCommand;
use crate::source::{CommandSource, Sender};

/// Routes `execute(sender, label, args)` through the descriptor's dispatcher.
///
/// The command line is rebuilt from the descriptor's own label, so every alias
/// lands on the same tree. Syntax errors go to the descriptor's handler when
/// there is one, which then owns reporting and the call counts as a success.
pub struct LegacyShim {
    label: String,
    configured_aliases: Vec<String>,
    active_aliases: RwLock<Vec<String>>,
    description: String,
    usage: String,
    permission: Option<String>,
    permission_message: Option<String>,
    syntax_error_handler: Option<SyntaxErrorHandler>,
    dispatcher: Arc<CommandDispatcher<CommandSource>>,
}

impl std::fmt::Debug for LegacyShim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyShim")
            .field("label", &self.label)
            .field("aliases", &self.aliases())
            .finish()
    }
}

impl LegacyShim {
    pub(crate) fn new(descriptor: &Descriptor) -> Self {
        Self {
            label: descriptor.label().to_string(),
            configured_aliases: descriptor.aliases().to_vec(),
            active_aliases: RwLock::new(descriptor.aliases().to_vec()),
            description: descriptor.description().unwrap_or_default().to_string(),
            usage: descriptor.usage(),
            permission: descriptor.permission().map(str::to_string),
            permission_message: descriptor.permission_message().map(str::to_string),
            syntax_error_handler: descriptor.syntax_error_handler().cloned(),
            dispatcher: Arc::clone(descriptor.dispatcher()),
        }
    }

    /// The full text handed to the grammar for a legacy call
    pub fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.label.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl LegacyCommand for LegacyShim {
    fn label(&self) -> &str {
        &self.label
    }

    fn aliases(&self) -> Vec<String> {
        self.active_aliases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn usage(&self) -> &str {
        &self.usage
    }

    fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    fn permission_message(&self) -> Option<&str> {
        self.permission_message.as_deref()
    }

    fn execute(&self, sender: &Sender, label: &str, args: &[String]) -> bool {
        let line = self.command_line(args);
        let source = CommandSource::new(sender.clone());
        debug!("{} ran '{label}' as '{line}'", sender.name());

        match self
            .dispatcher
            .execute(StringReader::from(line.clone()), source.clone())
        {
            Ok(_) => true,
            Err(err) => match &self.syntax_error_handler {
                Some(handler) => {
                    handler(&source, &err);
                    true
                }
                None => {
                    debug!("'{line}' failed with no handler: {err:?}");
                    false
                }
            },
        }
    }

    fn configured_aliases(&self) -> Vec<String> {
        self.configured_aliases.clone()
    }

    fn set_active_aliases(&self, aliases: Vec<String>) {
        *self.active_aliases.write().unwrap_or_else(PoisonError::into_inner) = aliases;
    }
}
