//! # Pinned Arrays
//!
//! Native functions that take a primitive buffer operate on a native copy of
//! a host array. [`Pinned`] acquires such a copy and hands it back to the
//! host when it goes out of scope, on every exit path, including early
//! returns via `?` and unwinding.
//!
//! The release mode decides whether changes made to the native copy are
//! written back ([`Release::Commit`], the default) or discarded
//! ([`Release::Abort`]).

use core::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::field::Element;
use crate::host::Host;

/// ## Release Modes
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Release {
    /// Write changes back to the host array.
    #[default]
    Commit,
    /// Discard changes.
    Abort,
}

/// ## Pinned Array
///
/// Native copy of a host primitive array, released on drop.
pub struct Pinned<'a, H: Host, T: Element> {
    host: &'a H,
    array: H::Object,
    elements: Vec<T>,
    mode: Release,
    released: bool,
}

impl<'a, H: Host, T: Element> Pinned<'a, H, T> {
    /// ## Acquire Array
    ///
    /// Copy the entire host `array` into native memory.
    pub fn acquire(host: &'a H, array: H::Object) -> Result<Self> {
        let mut elements = vec![T::default(); host.array_length(array)?];
        host.get_array_region(array, 0, &mut elements)?;

        tracing::trace!(elements = elements.len(), "pinned array");

        Ok(Self {
            host: host,
            array: array,
            elements: elements,
            mode: Release::Commit,
            released: false,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Release mode used on drop.
    pub fn mode(&self) -> Release {
        self.mode
    }

    /// Select the release mode used on drop.
    pub fn set_mode(&mut self, mode: Release) {
        self.mode = mode;
    }

    /// Release the array now, discarding all changes.
    pub fn abort(mut self) {
        self.mode = Release::Abort;
        self.released = true;
    }

    /// ## Release Array
    ///
    /// Release the array now, according to the selected mode. Unlike
    /// dropping the guard, this reports a failing write-back.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.write_back()
    }

    fn write_back(&self) -> Result<()> {
        match self.mode {
            Release::Commit => self.host.set_array_region(self.array, 0, &self.elements),
            Release::Abort => Ok(()),
        }
    }
}

impl<'a, H: Host, T: Element> Deref for Pinned<'a, H, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.elements
    }
}

impl<'a, H: Host, T: Element> DerefMut for Pinned<'a, H, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }
}

impl<'a, H: Host, T: Element> Drop for Pinned<'a, H, T> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        if let Err(e) = self.write_back() {
            tracing::warn!(error = %e, "cannot release pinned array");
        }
    }
}
