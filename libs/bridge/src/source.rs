//! Command invokers and the execution source handed to the grammar.
//!
//! A [`Sender`] is whoever typed the command: a player, the console, a command
//! block or some other entity. Each kind exposes a different subset of world
//! information, so [`CommandSource`] answers every accessor with an `Option`.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

/// Permission node that grants every permission
pub const WILDCARD_PERMISSION: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}, {:.1}, {:.1}", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: Uuid,
    pub name: String,
    pub world: String,
    pub location: Location,
}

impl Entity {
    pub fn new(name: impl Into<String>, world: impl Into<String>, location: Location) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            world: world.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub world: String,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SenderKind {
    Player(Entity),
    Entity(Entity),
    Block(Block),
    Console,
}

/// Someone able to run commands and receive messages.
///
/// Clones share the same message outbox.
#[derive(Clone)]
pub struct Sender {
    kind: SenderKind,
    permissions: HashSet<String>,
    outbox: Arc<Mutex<Vec<String>>>,
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("name", &self.name())
            .field("kind", &self.kind)
            .finish()
    }
}

impl Sender {
    pub fn new(kind: SenderKind) -> Self {
        Self {
            kind,
            permissions: HashSet::new(),
            outbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn console() -> Self {
        Self::new(SenderKind::Console)
    }

    pub fn player(name: impl Into<String>, world: impl Into<String>, location: Location) -> Self {
        Self::new(SenderKind::Player(Entity::new(name, world, location)))
    }

    pub fn entity(entity: Entity) -> Self {
        Self::new(SenderKind::Entity(entity))
    }

    pub fn block(world: impl Into<String>, location: Location) -> Self {
        Self::new(SenderKind::Block(Block {
            world: world.into(),
            location,
        }))
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn kind(&self) -> &SenderKind {
        &self.kind
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            SenderKind::Player(entity) | SenderKind::Entity(entity) => &entity.name,
            SenderKind::Block(_) => "@",
            SenderKind::Console => "CONSOLE",
        }
    }

    /// The console holds every permission; everyone else needs the node or `*`
    pub fn has_permission(&self, permission: &str) -> bool {
        matches!(self.kind, SenderKind::Console)
            || self.permissions.contains(WILDCARD_PERMISSION)
            || self.permissions.contains(permission)
    }

    pub fn send_message(&self, message: impl Into<String>) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.into());
    }

    /// Drain every message sent so far
    pub fn take_messages(&self) -> Vec<String> {
        std::mem::take(&mut *self.outbox.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// The source a command runs with: the sender plus its optional world context
#[derive(Debug, Clone)]
pub struct CommandSource {
    sender: Sender,
}

impl CommandSource {
    pub fn new(sender: Sender) -> Self {
        Self { sender }
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn entity(&self) -> Option<&Entity> {
        match self.sender.kind() {
            SenderKind::Player(entity) | SenderKind::Entity(entity) => Some(entity),
            SenderKind::Block(_) | SenderKind::Console => None,
        }
    }

    pub fn world(&self) -> Option<&str> {
        match self.sender.kind() {
            SenderKind::Player(entity) | SenderKind::Entity(entity) => Some(&entity.world),
            SenderKind::Block(block) => Some(&block.world),
            SenderKind::Console => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self.sender.kind() {
            SenderKind::Player(entity) | SenderKind::Entity(entity) => Some(entity.location),
            SenderKind::Block(block) => Some(block.location),
            SenderKind::Console => None,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.sender.has_permission(permission)
    }

    pub fn send_message(&self, message: impl Into<String>) {
        self.sender.send_message(message);
    }
}

impl From<Sender> for CommandSource {
    fn from(sender: Sender) -> Self {
        Self::new(sender)
    }
}
