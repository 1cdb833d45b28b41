//! Host-side provider registry.
//!
//! The host audio subsystem keeps named providers for each kind of stream and
//! dispatches allocation requests to them by name. A provider stays registered
//! for as long as its [`Registration`] is alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::stream::{AudioStream, ErrorHandler, ReadHandler, StreamParams, WriteHandler};

/// What a provider hands back for an allocation request.
pub type AllocResult = Result<Box<dyn AudioStream>>;

type PlayerAlloc = Arc<
    dyn Fn(&StreamParams, &str, WriteHandler, Option<ErrorHandler>) -> AllocResult + Send + Sync,
>;

type SourceAlloc = Arc<
    dyn Fn(&StreamParams, &str, ReadHandler, Option<ErrorHandler>) -> AllocResult + Send + Sync,
>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Player,
    Source,
}

struct Entry<F> {
    id: u64,
    name: String,
    alloc: F,
}

struct Providers<F> {
    entries: Mutex<Vec<Entry<F>>>,
}

impl<F: Clone> Providers<F> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn insert(&self, id: u64, name: &str, alloc: F) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| e.name == name) {
            return Err(Error::AlreadyRegistered(name.to_owned()));
        }
        entries.push(Entry {
            id,
            name: name.to_owned(),
            alloc,
        });
        Ok(())
    }

    fn remove(&self, id: u64) {
        self.entries.lock().retain(|e| e.id != id);
    }

    /// Clone of the allocator, so it runs without the registry locked.
    fn find(&self, name: &str) -> Result<F> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.alloc.clone())
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }

    fn names(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.name.clone()).collect()
    }
}

struct Registry {
    next_id: AtomicU64,
    players: Providers<PlayerAlloc>,
    sources: Providers<SourceAlloc>,
}

/// Registry of player and source providers.
pub struct AudioHost {
    registry: Arc<Registry>,
}

impl Default for AudioHost {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioHost {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                players: Providers::new(),
                sources: Providers::new(),
            }),
        }
    }

    /// Register a playback provider under `name`.
    pub fn register_player<F>(&self, name: &str, alloc: F) -> Result<Registration>
    where
        F: Fn(&StreamParams, &str, WriteHandler, Option<ErrorHandler>) -> AllocResult
            + Send
            + Sync
            + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.players.insert(id, name, Arc::new(alloc))?;
        debug!(name, "player registered");
        Ok(self.registration(Kind::Player, id, name))
    }

    /// Register a capture provider under `name`.
    pub fn register_source<F>(&self, name: &str, alloc: F) -> Result<Registration>
    where
        F: Fn(&StreamParams, &str, ReadHandler, Option<ErrorHandler>) -> AllocResult
            + Send
            + Sync
            + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.sources.insert(id, name, Arc::new(alloc))?;
        debug!(name, "source registered");
        Ok(self.registration(Kind::Source, id, name))
    }

    /// Allocate a playback stream from the provider registered as `name`.
    pub fn alloc_player(
        &self,
        name: &str,
        params: &StreamParams,
        device: &str,
        producer: WriteHandler,
        on_error: Option<ErrorHandler>,
    ) -> AllocResult {
        let alloc = self.registry.players.find(name)?;
        alloc(params, device, producer, on_error)
    }

    /// Allocate a capture stream from the provider registered as `name`.
    pub fn alloc_source(
        &self,
        name: &str,
        params: &StreamParams,
        device: &str,
        consumer: ReadHandler,
        on_error: Option<ErrorHandler>,
    ) -> AllocResult {
        let alloc = self.registry.sources.find(name)?;
        alloc(params, device, consumer, on_error)
    }

    pub fn players(&self) -> Vec<String> {
        self.registry.players.names()
    }

    pub fn sources(&self) -> Vec<String> {
        self.registry.sources.names()
    }

    fn registration(&self, kind: Kind, id: u64, name: &str) -> Registration {
        Registration {
            registry: Arc::downgrade(&self.registry),
            kind,
            id,
            name: name.to_owned(),
        }
    }
}

/// Keeps a provider registered. Dropping it removes the provider.
pub struct Registration {
    registry: Weak<Registry>,
    kind: Kind,
    id: u64,
    name: String,
}

impl Registration {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        match self.kind {
            Kind::Player => registry.players.remove(self.id),
            Kind::Source => registry.sources.remove(self.id),
        }
        debug!(name = %self.name, kind = ?self.kind, "provider released");
    }
}
