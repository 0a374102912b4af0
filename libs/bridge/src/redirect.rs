use std::sync::Arc;

use azalea_brigadier::prelude::literal;
use azalea_brigadier::tree::CommandNode;
use parking_lot::RwLock;

/// A new literal named `name` (lowercased) that behaves like `source`.
///
/// The requirement, redirect target, redirect modifier, fork flag and action
/// are copied and every child of `source` is attached by reference. Children
/// added to `source` afterwards are not seen by the redirect.
pub fn build_redirect<S: 'static>(
    name: impl AsRef<str>,
    source: &Arc<RwLock<CommandNode<S>>>,
) -> Arc<RwLock<CommandNode<S>>> {
    let source = source.read();
    let mut node = literal::<S>(&name.as_ref().to_lowercase()).build();
    node.requirement = Arc::clone(&source.requirement);
    node.redirect = source.redirect.clone();
    node.modifier = source.modifier.clone();
    node.forks = source.forks;
    node.command = source.command.clone();

    for child in source.children.values() {
        node.add_child(child);
    }
    Arc::new(RwLock::new(node))
}

#[cfg(test)]
mod tests {
    use azalea_brigadier::prelude::{
        CommandContext, CommandDispatcher, argument, get_integer, integer,
    };
    use azalea_brigadier::string_reader::StringReader;

    use super::*;

    struct Source {
        admin: bool,
    }

    #[test]
    fn test_copies_structure_under_new_name() {
        let target = Arc::new(RwLock::new(literal::<Source>("target").build()));
        let mut original = literal("foo")
            .requires(|source: &Source| source.admin)
            .executes(|_| 7)
            .then(argument("n", integer()).executes(|_| 1))
            .build();
        original.redirect = Some(Arc::clone(&target));
        original.forks = true;
        let original = Arc::new(RwLock::new(original));

        let redirect = build_redirect("Alias", &original);
        let redirect = redirect.read();
        let original = original.read();

        assert_eq!(redirect.name(), "alias");
        assert!(Arc::ptr_eq(&redirect.requirement, &original.requirement));
        assert!(Arc::ptr_eq(redirect.redirect.as_ref().unwrap(), &target));
        assert!(redirect.modifier.is_none());
        assert!(redirect.forks);
        assert!(redirect.command.is_some());
        assert!(Arc::ptr_eq(
            redirect.children.get("n").unwrap(),
            original.children.get("n").unwrap()
        ));
        assert_eq!(redirect.children.len(), original.children.len());
    }

    #[test]
    fn test_redirect_executes_like_source() {
        let original = Arc::new(RwLock::new(
            literal::<Source>("foo")
                .then(argument("n", integer()).executes(|ctx: &CommandContext<Source>| {
                    get_integer(ctx, "n").unwrap_or(0)
                }))
                .build(),
        ));

        let dispatcher = CommandDispatcher::<Source>::new();
        dispatcher
            .root
            .write()
            .add_child(&build_redirect("bar", &original));

        let result = dispatcher.execute(
            StringReader::from("bar 5".to_string()),
            Source { admin: false },
        );
        assert_eq!(result.unwrap(), 5);
    }
}
