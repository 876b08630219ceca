//! # Marshalling Environment
//!
//! An [`Env`] is the explicit context of a single wrapper call. It pairs the
//! host runtime the call came from with the globals block of the library the
//! call entered, and provides the field-copy operations of the marshaller.
//!
//! A wrapper typically obtains its globals block, creates an environment via
//! [`LibraryGlobals::env()`], copies the mirror object into a native struct
//! on its stack, calls the native function, and copies the struct back:
//!
//! ```rust,ignore
//! let globals = GlobalTable::process().get_globals::<LibraryGlobals<JniHost>>(LIBRARY)?;
//! let env = globals.env(&host);
//! let mut rect = XRectangle::default();
//! env.with_fields(object, &mut rect, |rect| unsafe { XFillRectangles(display, rect, 1) })?;
//! ```

use crate::cache::Marshal;
use crate::config::Config;
use crate::error::Result;
use crate::globals::LibraryGlobals;
use crate::host::Host;

/// ## Call Environment
pub struct Env<'a, H: Host> {
    host: &'a H,
    globals: &'a LibraryGlobals<H>,
}

impl<'a, H: Host> Env<'a, H> {
    /// Create an environment for a call from `host` into the library owning
    /// `globals`.
    pub fn new(host: &'a H, globals: &'a LibraryGlobals<H>) -> Self {
        Self {
            host: host,
            globals: globals,
        }
    }

    /// Host runtime of the call.
    pub fn host(&self) -> &'a H {
        self.host
    }

    /// Globals block of the library.
    pub fn globals(&self) -> &'a LibraryGlobals<H> {
        self.globals
    }

    /// Configuration of the library.
    pub fn config(&self) -> &'a Config {
        self.globals.config()
    }

    /// ## Cache Fields
    ///
    /// Resolve the field cache of `T` against the class of `object`, unless
    /// already resolved. Fails if the mirror class does not declare every
    /// field of `T`.
    pub fn cache_fields<T: Marshal>(&self, object: H::Object) -> Result<()> {
        let cache = self.globals.cache::<T>();
        cache.resolve(self.host, object, T::CLASS, T::FIELDS, self.config())?;
        Ok(())
    }

    /// ## Get Fields
    ///
    /// Copy all fields of the mirror `object` into `dst`, resolving the field
    /// cache of `T` first if needed. Returns `dst` for convenience.
    ///
    /// On failure `dst` may be partially updated.
    pub fn get_fields<'b, T: Marshal>(
        &self,
        object: H::Object,
        dst: &'b mut T,
    ) -> Result<&'b mut T> {
        let cache = self.globals.cache::<T>();
        let resolved = cache.resolve(self.host, object, T::CLASS, T::FIELDS, self.config())?;

        tracing::trace!(class = T::CLASS, "get fields");
        T::read_mirror(self, object, resolved.fields(), dst)?;
        Ok(dst)
    }

    /// ## Get New Struct
    ///
    /// Create a default native struct and copy the mirror `object` into it.
    pub fn get_new<T: Marshal + Default>(&self, object: H::Object) -> Result<T> {
        let mut v = T::default();
        self.get_fields(object, &mut v)?;
        Ok(v)
    }

    /// ## Set Fields
    ///
    /// Copy all fields of `src` into the mirror `object`, resolving the field
    /// cache of `T` first if needed.
    ///
    /// All fields, including those of nested structs, are checked before the
    /// first one is written. Values that do not fit their mirror, mirror
    /// arrays of another length, and null nested objects or arrays thus
    /// leave the mirror untouched. Only a failure of the host runtime itself
    /// can leave it partially updated.
    pub fn set_fields<T: Marshal>(&self, object: H::Object, src: &T) -> Result<()> {
        self.check_fields(object, src)?;
        self.write_fields(object, src)
    }

    pub(crate) fn check_fields<T: Marshal>(&self, object: H::Object, src: &T) -> Result<()> {
        let cache = self.globals.cache::<T>();
        let resolved = cache.resolve(self.host, object, T::CLASS, T::FIELDS, self.config())?;
        src.check_mirror(self, object, resolved.fields())
    }

    pub(crate) fn write_fields<T: Marshal>(&self, object: H::Object, src: &T) -> Result<()> {
        let cache = self.globals.cache::<T>();
        let resolved = cache.resolve(self.host, object, T::CLASS, T::FIELDS, self.config())?;

        tracing::trace!(class = T::CLASS, "set fields");
        src.write_mirror(self, object, resolved.fields())
    }

    /// ## Marshal Around Native Call
    ///
    /// Copy the mirror `object` into `native`, run `call` on it, and copy the
    /// possibly modified struct back into the mirror. This is the in/out
    /// pattern of every wrapper that passes a struct by reference.
    ///
    /// If copying in fails, `call` is not run. Copying back follows the rules
    /// of [`Env::set_fields()`].
    pub fn with_fields<T, R, F>(
        &self,
        object: H::Object,
        native: &mut T,
        call: F,
    ) -> Result<R>
    where
        T: Marshal,
        F: FnOnce(&mut T) -> R,
    {
        self.get_fields(object, native)?;
        let v = call(native);
        self.set_fields(object, native)?;
        Ok(v)
    }
}
