//! A named command: a grammar tree plus the metadata the legacy registry
//! needs and an optional handler for syntax errors.
//!
//! Everything derived from the grammar is built on first use and memoized:
//! [`Descriptor::tree`] materializes the tree, [`Descriptor::dispatcher`] roots a
//! dispatcher at it and [`Descriptor::shim`] wraps that dispatcher for the
//! legacy registry. Once any of them has run the grammar is frozen.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use azalea_brigadier::builder::argument_builder::ArgumentBuilder;
use azalea_brigadier::exceptions::CommandSyntaxException;
use azalea_brigadier::prelude::{CommandContext, CommandDispatcher, literal};
use azalea_brigadier::tree::CommandNode;
use parking_lot::RwLock;
use tracing::warn;
use uuid::Uuid;

use crate::builder::DescriptorBuilder;
use crate::error::{BridgeError, BridgeResult};
use crate::shim::LegacyShim;
use crate::source::CommandSource;

/// Root builder handed to grammar authoring callbacks
pub type LiteralBuilder = ArgumentBuilder<CommandSource>;

/// A built grammar node, shared between trees
pub type GrammarNode = Arc<RwLock<CommandNode<CommandSource>>>;

/// What command actions receive
pub type CommandCtx = CommandContext<CommandSource>;

/// Called instead of reporting failure when input does not match the grammar
pub type SyntaxErrorHandler =
    Arc<dyn Fn(&CommandSource, &CommandSyntaxException) + Send + Sync>;

/// Opaque identity of a [`Descriptor`], independent of its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorId(Uuid);

impl DescriptorId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub struct Descriptor {
    id: DescriptorId,
    label: String,
    aliases: Vec<String>,
    description: Option<String>,
    usage: Option<String>,
    permission: Option<String>,
    permission_message: Option<String>,
    syntax_error_handler: Option<SyntaxErrorHandler>,
    /// Taken when the tree is built
    grammar: Mutex<Option<LiteralBuilder>>,
    tree: OnceLock<GrammarNode>,
    dispatcher: OnceLock<Arc<CommandDispatcher<CommandSource>>>,
    shim: OnceLock<Arc<LegacyShim>>,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("built", &self.is_built())
            .finish()
    }
}

impl Descriptor {
    /// Create a descriptor whose grammar is a bare literal named after `label`.
    ///
    /// The label is trimmed and lowercased. Use [`Descriptor::try_new`] to
    /// reject labels that cannot be typed as a single word.
    pub fn new(label: impl AsRef<str>) -> Self {
        let label = label.as_ref().trim().to_lowercase();
        Self {
            id: DescriptorId::new(),
            grammar: Mutex::new(Some(literal(&label))),
            label,
            aliases: Vec::new(),
            description: None,
            usage: None,
            permission: None,
            permission_message: None,
            syntax_error_handler: None,
            tree: OnceLock::new(),
            dispatcher: OnceLock::new(),
            shim: OnceLock::new(),
        }
    }

    pub fn try_new(label: impl AsRef<str>) -> BridgeResult<Self> {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
            return Err(BridgeError::InvalidLabel(label.as_ref().to_string()));
        }
        Ok(Self::new(trimmed))
    }

    pub fn builder(label: impl AsRef<str>) -> DescriptorBuilder {
        DescriptorBuilder::new(Self::new(label))
    }

    pub fn id(&self) -> DescriptorId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The aliases this descriptor was configured with, whether or not the
    /// legacy registry let them all through
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The configured usage, or `/<label>`
    pub fn usage(&self) -> String {
        self.usage
            .clone()
            .unwrap_or_else(|| format!("/{}", self.label))
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn permission_message(&self) -> Option<&str> {
        self.permission_message.as_deref()
    }

    pub fn syntax_error_handler(&self) -> Option<&SyntaxErrorHandler> {
        self.syntax_error_handler.as_ref()
    }

    pub fn set_aliases<I, A>(&mut self, aliases: I)
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn set_usage(&mut self, usage: impl Into<String>) {
        self.usage = Some(usage.into());
    }

    pub fn set_permission(&mut self, permission: impl Into<String>) {
        self.permission = Some(permission.into());
    }

    pub fn set_permission_message(&mut self, message: impl Into<String>) {
        self.permission_message = Some(message.into());
    }

    pub fn set_syntax_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(&CommandSource, &CommandSyntaxException) + Send + Sync + 'static,
    {
        self.syntax_error_handler = Some(Arc::new(handler));
    }

    /// Replace the root literal with whatever `edit` builds from it. Ignored
    /// once the tree has been built.
    pub fn edit_grammar<F>(&mut self, edit: F)
    where
        F: FnOnce(LiteralBuilder) -> LiteralBuilder,
    {
        let slot = self.grammar.get_mut().unwrap_or_else(PoisonError::into_inner);
        match slot.take() {
            Some(grammar) => *slot = Some(edit(grammar)),
            None => warn!("Grammar of '{}' is already built; edit ignored", self.label),
        }
    }

    /// The grammar tree, built on first call
    pub fn tree(&self) -> &GrammarNode {
        self.tree.get_or_init(|| {
            let grammar = self
                .grammar
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .unwrap_or_else(|| literal(&self.label));
            Arc::new(RwLock::new(grammar.build()))
        })
    }

    /// A dispatcher whose only root child is [`tree`](Self::tree)
    pub fn dispatcher(&self) -> &Arc<CommandDispatcher<CommandSource>> {
        self.dispatcher.get_or_init(|| {
            let dispatcher = CommandDispatcher::<CommandSource>::new();
            dispatcher.root.write().add_child(self.tree());
            Arc::new(dispatcher)
        })
    }

    /// The object handed to the legacy registry
    pub fn shim(&self) -> &Arc<LegacyShim> {
        self.shim.get_or_init(|| Arc::new(LegacyShim::new(self)))
    }

    /// Whether the grammar has been frozen into a tree
    pub fn is_built(&self) -> bool {
        self.tree.get().is_some()
    }
}
