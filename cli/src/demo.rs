//! Commands the console host registers at startup.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use azalea_brigadier::prelude::{
    argument, double, get_double, get_integer, get_string, greedy_string, integer, literal, word,
};
use cmdbridge_core::{CommandCtx, CommandSource, Descriptor, Location};

const MAX_STEP: i32 = 1000;

pub fn descriptors() -> Vec<Descriptor> {
    vec![greet(), teleport(), counter(0), echo()]
}

fn greet() -> Descriptor {
    Descriptor::builder("greet")
        .aliases(["hi"])
        .description("Say hello to someone")
        .usage("/greet <name>")
        .on_syntax_error(|source, err| {
            source.send_message(format!("Usage: /greet <name> ({err:?})"));
        })
        .logic(|root| {
            root.then(argument("name", word()).executes(|ctx: &CommandCtx| {
                let name = get_string(ctx, "name").unwrap_or_default();
                ctx.source.send_message(format!("Hello, {name}!"));
                1
            }))
        })
        .build()
}

fn teleport() -> Descriptor {
    Descriptor::builder("teleport")
        .aliases(["tp"])
        .description("Move yourself to a position")
        .usage("/teleport <x> <y> <z>")
        .logic(|root| {
            root.requires(|source: &CommandSource| source.entity().is_some())
                .then(argument("x", double()).then(argument("y", double()).then(
                    argument("z", double()).executes(|ctx: &CommandCtx| {
                        let coordinate = |name: &str| get_double(ctx, name).unwrap_or_default();
                        let target =
                            Location::new(coordinate("x"), coordinate("y"), coordinate("z"));
                        let world = ctx.source.world().unwrap_or("nowhere");
                        ctx.source
                            .send_message(format!("Teleported to {target} in {world}"));
                        1
                    }),
                )))
        })
        .build()
}

fn counter(start: i32) -> Descriptor {
    let value = Arc::new(AtomicI32::new(start));
    let add = value.clone();
    let show = value.clone();
    let reset = value;

    Descriptor::builder("counter")
        .description("A shared counter")
        .usage("/counter <add <amount>|show|reset>")
        .logic(move |root| {
            root.then(literal("add").then(argument("amount", integer()).executes(
                move |ctx: &CommandCtx| {
                    let amount = get_integer(ctx, "amount").unwrap_or_default();
                    if !(1..=MAX_STEP).contains(&amount) {
                        ctx.source
                            .send_message(format!("Amount must be between 1 and {MAX_STEP}"));
                        return 0;
                    }
                    match add.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                        current.checked_add(amount)
                    }) {
                        Ok(previous) => {
                            let total = previous.saturating_add(amount);
                            ctx.source.send_message(format!("Counter is now {total}"));
                            total
                        }
                        Err(current) => {
                            ctx.source
                                .send_message(format!("Counter is full at {current}"));
                            0
                        }
                    }
                },
            )))
            .then(literal("show").executes(move |ctx: &CommandCtx| {
                let total = show.load(Ordering::SeqCst);
                ctx.source.send_message(format!("Counter is {total}"));
                total
            }))
            .then(literal("reset").executes(move |ctx: &CommandCtx| {
                reset.store(0, Ordering::SeqCst);
                ctx.source.send_message("Counter reset");
                1
            }))
        })
        .build()
}

fn echo() -> Descriptor {
    Descriptor::builder("echo")
        .description("Repeat a message back")
        .usage("/echo <message>")
        .permission("cmdbridge.echo")
        .permission_message("You may not echo.")
        .logic(|root| {
            root.then(argument("message", greedy_string()).executes(|ctx: &CommandCtx| {
                ctx.source
                    .send_message(get_string(ctx, "message").unwrap_or_default());
                1
            }))
        })
        .build()
}
