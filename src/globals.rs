//! # Per-Library Globals
//!
//! Several independently built native libraries can be resident in one
//! process, all serving the same host runtime. Each of them needs a private
//! block of mutable state that survives across calls, most importantly its
//! field caches. This module provides:
//!
//!  * [`GlobalTable`]: a registry of state blocks, keyed by [`LibraryId`].
//!    One table exists per process ([`GlobalTable::process()`]), but
//!    independent tables can be created for isolation.
//!
//!  * [`LibraryGlobals`]: the standard state block of a marshalling library,
//!    holding one field cache per marshalled struct type.
//!
//! A slot is owned exclusively by the library with the matching ID. Slots
//! move from `Uninitialized` to `Initialized` exactly once. Only unloading a
//! library ([`GlobalTable::clear_globals()`]) returns its slot to
//! `Uninitialized`.

use core::any::{Any, TypeId};
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::cache::{FieldCache, Marshal};
use crate::config::Config;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::host::Host;

/// ## Library Identifier
///
/// Identifies a library within the process. IDs are assigned by convention
/// and must not collide between libraries loaded into the same process.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LibraryId(u32);

/// ## Slot State
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SlotState {
    Uninitialized,
    Initialized,
}

type Block = Arc<dyn Any + Send + Sync>;

/// ## Global Table
///
/// Registry of per-library state blocks.
pub struct GlobalTable {
    slots: RwLock<BTreeMap<LibraryId, Block>>,
}

/// ## Library Globals
///
/// The state block of a marshalling library: its configuration, its field
/// caches, its first-use initialization flag, and a counter of calls that
/// entered the library.
pub struct LibraryGlobals<H: Host> {
    id: LibraryId,
    config: Config,
    caches: DashMap<TypeId, Arc<FieldCache<H>>>,
    initialized: OnceCell<()>,
    entries: AtomicU64,
}

static PROCESS: GlobalTable = GlobalTable::new();

impl LibraryId {
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for LibraryId {
    fn fmt(&self, fmt: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(fmt, "library#{}", self.0)
    }
}

impl GlobalTable {
    /// Create a new table with all slots uninitialized.
    pub const fn new() -> Self {
        Self {
            slots: parking_lot::const_rwlock(BTreeMap::new()),
        }
    }

    /// The process-wide table shared by all libraries.
    pub fn process() -> &'static GlobalTable {
        &PROCESS
    }

    /// State of the slot of `id`.
    pub fn state(&self, id: LibraryId) -> SlotState {
        match self.slots.read().contains_key(&id) {
            true => SlotState::Initialized,
            false => SlotState::Uninitialized,
        }
    }

    /// ## Set Globals
    ///
    /// Store `block` as the globals of `id`. This is the one transition of
    /// the slot to `Initialized`. Setting an initialized slot fails and leaves
    /// the stored block untouched.
    pub fn set_globals<G>(&self, id: LibraryId, block: Arc<G>) -> Result<()>
    where
        G: Any + Send + Sync,
    {
        let mut slots = self.slots.write();
        if slots.contains_key(&id) {
            return Err(Error::AlreadyInitialized(id));
        }

        slots.insert(id, block);
        tracing::debug!(library = %id, "globals initialized");
        Ok(())
    }

    /// ## Get Globals
    ///
    /// Return the globals of `id`. The same block is returned for as long as
    /// the library is resident. Fails if the slot was never set, or if it
    /// holds a block of another type than `G`.
    pub fn get_globals<G>(&self, id: LibraryId) -> Result<Arc<G>>
    where
        G: Any + Send + Sync,
    {
        let block = self.slots.read().get(&id).cloned().ok_or(Error::Uninitialized(id))?;
        block.downcast::<G>().map_err(|_| Error::GlobalsType(id))
    }

    /// ## Get or Initialize Globals
    ///
    /// Return the globals of `id`, creating them via `init` if the slot is
    /// uninitialized. `init` runs at most once per slot, even if several
    /// threads enter the library for the first time concurrently.
    pub fn get_or_init_globals<G, F>(&self, id: LibraryId, init: F) -> Result<Arc<G>>
    where
        G: Any + Send + Sync,
        F: FnOnce() -> G,
    {
        if let Some(block) = self.slots.read().get(&id).cloned() {
            return block.downcast::<G>().map_err(|_| Error::GlobalsType(id));
        }

        let block = self
            .slots
            .write()
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(library = %id, "globals initialized");
                Arc::new(init())
            })
            .clone();
        block.downcast::<G>().map_err(|_| Error::GlobalsType(id))
    }

    /// ## Clear Globals
    ///
    /// Return the slot of `id` to `Uninitialized`, as part of unloading the
    /// library. Returns whether the slot was initialized. Blocks still held
    /// by callers stay valid until they are dropped.
    pub fn clear_globals(&self, id: LibraryId) -> bool {
        let v = self.slots.write().remove(&id).is_some();
        if v {
            tracing::debug!(library = %id, "globals cleared");
        }
        v
    }
}

impl Default for GlobalTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> LibraryGlobals<H> {
    pub fn new(id: LibraryId, config: Config) -> Self {
        Self {
            id: id,
            config: config,
            caches: DashMap::new(),
            initialized: OnceCell::new(),
            entries: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> LibraryId {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// ## Field Cache of Type
    ///
    /// Return the field cache of the native struct `T`, creating an
    /// unresolved one on first use.
    pub fn cache<T: Marshal>(&self) -> Arc<FieldCache<H>> {
        let key = TypeId::of::<T>();

        if let Some(v) = self.caches.get(&key) {
            return v.value().clone();
        }

        self.caches
            .entry(key)
            .or_insert_with(|| Arc::new(FieldCache::new()))
            .value()
            .clone()
    }

    /// Number of struct types with a field cache.
    pub fn cached_types(&self) -> usize {
        self.caches.len()
    }

    /// Whether first-use setup ran successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized.get().is_some()
    }

    /// ## First-Use Setup
    ///
    /// Run `setup` unless it already ran successfully. Concurrent callers
    /// wait for the running setup. A failed setup is retried by the next
    /// caller.
    pub fn initialize<F>(&self, setup: F) -> Result<()>
    where
        F: FnOnce(&Self) -> Result<()>,
    {
        self.initialized.get_or_try_init(|| setup(self))?;
        Ok(())
    }

    /// Number of environments created for calls into the library.
    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    /// ## Enter Library
    ///
    /// Create the environment of a call from `host` into this library.
    pub fn env<'a>(&'a self, host: &'a H) -> Env<'a, H> {
        self.entries.fetch_add(1, Ordering::Relaxed);
        Env::new(host, self)
    }
}
