use azalea_brigadier::exceptions::CommandSyntaxException;

use crate::descriptor::{Descriptor, LiteralBuilder};
use crate::source::CommandSource;

/// Fluent construction of a [`Descriptor`].
///
/// ```rust
/// use azalea_brigadier::prelude::{argument, integer};
/// use cmdbridge_core::{CommandCtx, Descriptor};
///
/// let descriptor = Descriptor::builder("foo")
///     .aliases(["bar"])
///     .description("Does foo things")
///     .logic(|root| root.then(argument("n", integer()).executes(|_: &CommandCtx| 1)))
///     .build();
///
/// assert_eq!(descriptor.label(), "foo");
/// assert_eq!(descriptor.aliases(), ["bar"]);
/// ```
#[derive(Debug)]
pub struct DescriptorBuilder {
    descriptor: Descriptor,
}

impl DescriptorBuilder {
    pub(crate) fn new(descriptor: Descriptor) -> Self {
        Self { descriptor }
    }

    pub fn aliases<I, A>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.descriptor.set_aliases(aliases);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.set_description(description);
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.descriptor.set_usage(usage);
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.descriptor.set_permission(permission);
        self
    }

    pub fn permission_message(mut self, message: impl Into<String>) -> Self {
        self.descriptor.set_permission_message(message);
        self
    }

    pub fn on_syntax_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandSource, &CommandSyntaxException) + Send + Sync + 'static,
    {
        self.descriptor.set_syntax_error_handler(handler);
        self
    }

    /// Author the grammar. `logic` receives the root literal and returns it
    /// with whatever arguments, subcommands and actions it needs.
    pub fn logic<F>(mut self, logic: F) -> Self
    where
        F: FnOnce(LiteralBuilder) -> LiteralBuilder,
    {
        self.descriptor.edit_grammar(logic);
        self
    }

    pub fn build(self) -> Descriptor {
        self.descriptor
    }
}
