//! # cmdbridge-core
//!
//! Registers tree-structured commands with a host that only understands a
//! flat, name-indexed command table.
//!
//! A [`Descriptor`] bundles a grammar tree with the metadata the legacy table
//! needs. [`CommandRegistry`] hands each descriptor's [`LegacyShim`] to a
//! [`LegacyRegistry`], swaps the host's passthrough nodes for redirects into
//! the real tree, and answers completion requests by re-parsing the buffer.
//! Grammar trees, parsing and execution come from `azalea-brigadier`.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use azalea_brigadier::prelude::{argument, integer};
//! use cmdbridge_core::{
//!     BridgeConfig, CommandCtx, CommandRegistry, Descriptor, Sender, SimpleCommandMap,
//! };
//!
//! let map = Arc::new(SimpleCommandMap::new());
//! let registry = CommandRegistry::new(BridgeConfig::new("demo"), map.clone()).unwrap();
//!
//! let foo = Descriptor::builder("foo")
//!     .logic(|root| root.then(argument("n", integer()).executes(|_: &CommandCtx| 1)))
//!     .build();
//! assert!(registry.register(Arc::new(foo)));
//!
//! let outcome = map.dispatch(&Sender::console(), "foo 42");
//! assert_eq!(outcome, cmdbridge_core::DispatchOutcome::Completed { success: true });
//! ```

pub mod builder;
pub mod completion;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod legacy;
pub mod redirect;
pub mod registry;
pub mod shim;
pub mod source;

pub use builder::DescriptorBuilder;
pub use completion::{Completion, Completions, complete_input};
pub use config::BridgeConfig;
pub use descriptor::{
    CommandCtx, Descriptor, DescriptorId, GrammarNode, LiteralBuilder, SyntaxErrorHandler,
};
pub use error::{BridgeError, BridgeResult};
pub use events::{
    CommandRegistered, EventBus, EventKind, EventPriority, HostListener, SuggestionRequest,
    TabComplete,
};
pub use legacy::{DispatchOutcome, LegacyCommand, LegacyRegistry, SimpleCommandMap};
pub use redirect::build_redirect;
pub use registry::{CommandRegistry, all_labels};
pub use shim::LegacyShim;
pub use source::{Block, CommandSource, Entity, Location, Sender, SenderKind};
