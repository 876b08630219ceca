//! # Field-ID Cache
//!
//! Looking up field handles in the host runtime is expensive compared to
//! reading a field. A [`FieldCache`] resolves the handles of every field of a
//! mirror class once, on first use, and keeps them for as long as its owning
//! library is resident.
//!
//! Resolution is a synchronized check-and-init. Concurrent first users block
//! until a single resolution finished, and all observe the same handles. If
//! resolution fails, the cache stays unresolved and the error is returned to
//! the caller that attempted it. A partially resolved cache is never
//! observable.
//!
//! Handles are resolved against the mirror class by name, never against the
//! class of whatever object happens to come first. Every object passed in is
//! checked to be an instance of that class before any handle is used on it.

use once_cell::sync::OnceCell;

use crate::config::Config;
use crate::env::Env;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::host::Host;
use crate::sig::Signature;

/// ## Field Declaration
///
/// A field of a native struct as declared for marshalling: the name of its
/// mirror field and its type.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FieldDesc {
    pub name: &'static str,
    pub signature: Signature,
}

/// ## Marshalled Struct
///
/// A native struct with a mirror class in the host runtime. The declared
/// fields are the single source of truth for both sides: the native layout
/// is the Rust struct, and the mirror layout is derived from its fields.
///
/// This trait is meant to be implemented via `#[derive(Marshal)]`.
/// `read_mirror()`, `write_mirror()`, and `check_mirror()` receive the
/// resolved fields in the order of [`Marshal::FIELDS`].
pub trait Marshal: Sized + 'static {
    /// Path of the mirror class, e.g., `org/example/Point`.
    const CLASS: &'static str;
    /// Marshalled fields, in declaration order.
    const FIELDS: &'static [FieldDesc];

    /// Copy all mirror fields of `object` into `dst`.
    fn read_mirror<H: Host>(
        env: &Env<'_, H>,
        object: H::Object,
        fields: &[Field<H>],
        dst: &mut Self,
    ) -> Result<()>;

    /// Copy all fields of `self` into the mirror `object`.
    fn write_mirror<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        fields: &[Field<H>],
    ) -> Result<()>;

    /// Verify that `write_mirror()` would accept every field of `self`,
    /// without modifying the mirror `object`.
    fn check_mirror<H: Host>(
        &self,
        env: &Env<'_, H>,
        object: H::Object,
        fields: &[Field<H>],
    ) -> Result<()>;
}

/// ## Resolved Cache
///
/// The mirror class and the handles of all its marshalled fields.
pub struct Resolved<H: Host> {
    class: H::Class,
    fields: Box<[Field<H>]>,
}

/// ## Field Cache
///
/// Lazily resolved field handles of one mirror class.
pub struct FieldCache<H: Host> {
    resolved: OnceCell<Resolved<H>>,
}

impl FieldDesc {
    pub const fn new(name: &'static str, signature: Signature) -> Self {
        Self {
            name: name,
            signature: signature,
        }
    }
}

impl<H: Host> Resolved<H> {
    fn lookup(
        host: &H,
        class: &'static str,
        fields: &'static [FieldDesc],
        config: &Config,
    ) -> Result<Self> {
        let owner = host.find_class(class)?.ok_or(Error::ClassNotFound { class: class })?;
        let mut resolved = Vec::with_capacity(fields.len());

        for desc in fields {
            let descriptor = desc.signature.descriptor(config.pointer);
            let id = match host.field_id(owner, desc.name, &descriptor) {
                Ok(Some(v)) => v,
                Ok(None) => {
                    host.release_class(owner);
                    return Err(Error::FieldNotFound {
                        class: class,
                        name: desc.name,
                        descriptor: descriptor.to_string(),
                    });
                },
                Err(e) => {
                    host.release_class(owner);
                    return Err(e);
                },
            };

            resolved.push(Field {
                name: desc.name,
                id: id,
                kind: descriptor.kind(),
            });
        }

        Ok(Self {
            class: owner,
            fields: resolved.into_boxed_slice(),
        })
    }

    /// Mirror class the cache was resolved against.
    pub fn class(&self) -> H::Class {
        self.class
    }

    /// Resolved fields, in declaration order.
    pub fn fields(&self) -> &[Field<H>] {
        &self.fields
    }
}

impl<H: Host> FieldCache<H> {
    /// Create a new, unresolved cache.
    pub const fn new() -> Self {
        Self {
            resolved: OnceCell::new(),
        }
    }

    /// Whether the cache was successfully resolved.
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolved handles, if the cache was resolved.
    pub fn get(&self) -> Option<&Resolved<H>> {
        self.resolved.get()
    }

    /// ## Resolve Cache
    ///
    /// Resolve the handles of `fields` against the mirror class named
    /// `class`, unless the cache is already resolved, in which case no
    /// lookup is done. Either way, `object` must be an instance of the
    /// mirror class, since the handles are only valid for its instances.
    pub fn resolve(
        &self,
        host: &H,
        object: H::Object,
        class: &'static str,
        fields: &'static [FieldDesc],
        config: &Config,
    ) -> Result<&Resolved<H>> {
        let resolved = self.resolved.get_or_try_init(|| {
            let v = Resolved::lookup(host, class, fields, config);
            match &v {
                Ok(_) => tracing::debug!(class, fields = fields.len(), "resolved field cache"),
                Err(e) => tracing::debug!(class, error = %e, "field cache resolution failed"),
            }
            v
        })?;

        if !host.is_instance_of(object, resolved.class)? {
            return Err(Error::ClassMismatch { class: class });
        }
        Ok(resolved)
    }
}

impl<H: Host> Default for FieldCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::sig::Primitive;

    const POINT: &[FieldDesc] = &[
        FieldDesc::new("x", Signature::Primitive(Primitive::Int)),
        FieldDesc::new("y", Signature::Primitive(Primitive::Int)),
    ];

    // Resolving twice is a no-op that returns the very same handles and
    // does not query the host again.
    #[test]
    fn resolve_idempotent() {
        let host = MemoryHost::new();
        let class = host.define_class("osi/test/Point", &[("x", "I"), ("y", "I")]).unwrap();
        let object = host.new_object(class);
        let cache = FieldCache::<MemoryHost>::new();
        let config = Config::default();

        assert!(!cache.is_resolved());

        let first: Vec<_> = cache
            .resolve(&host, object, "osi/test/Point", POINT, &config)
            .unwrap()
            .fields()
            .iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(host.lookups(), 2);

        let second = cache.resolve(&host, object, "osi/test/Point", POINT, &config).unwrap();
        assert_eq!(host.lookups(), 2);
        assert!(cache.is_resolved());
        assert_eq!(second.class(), class);
        assert_eq!(second.fields().iter().map(|v| v.id).collect::<Vec<_>>(), first);
        assert_eq!(second.fields()[0].name, "x");
        assert_eq!(second.fields()[1].name, "y");
    }

    // A missing field fails resolution and leaves the cache unresolved.
    #[test]
    fn resolve_failure() {
        let host = MemoryHost::new();
        let class = host.define_class("osi/test/Point", &[("x", "I")]).unwrap();
        let cache = FieldCache::<MemoryHost>::new();

        let e = cache
            .resolve(&host, host.new_object(class), "osi/test/Point", POINT, &Config::default())
            .err()
            .unwrap();
        assert!(matches!(e, Error::FieldNotFound { name: "y", .. }));
        assert!(!cache.is_resolved());
        assert!(cache.get().is_none());
    }

    // An object of another class with the same field names neither binds
    // the cache to its class nor passes once the cache is resolved.
    #[test]
    fn resolve_other_class() {
        let host = MemoryHost::new();
        let point = host.define_class("osi/test/Point", &[("x", "I"), ("y", "I")]).unwrap();
        let other = host.define_class("osi/test/Other", &[("x", "I"), ("y", "I")]).unwrap();
        let cache = FieldCache::<MemoryHost>::new();
        let config = Config::default();

        let e = cache
            .resolve(&host, host.new_object(other), "osi/test/Point", POINT, &config)
            .err()
            .unwrap();
        assert!(matches!(e, Error::ClassMismatch { class: "osi/test/Point" }));
        assert_eq!(cache.get().map(|v| v.class()), Some(point));

        cache.resolve(&host, host.new_object(point), "osi/test/Point", POINT, &config).unwrap();
        assert!(cache.resolve(&host, host.new_object(other), "osi/test/Point", POINT, &config).is_err());
        assert_eq!(host.lookups(), 2);
    }

    // An unknown mirror class fails resolution, as do objects without a
    // class, such as arrays.
    #[test]
    fn resolve_no_class() {
        let host = MemoryHost::new();
        let array = host.new_array::<i32>(&[1, 2]);
        let cache = FieldCache::<MemoryHost>::new();

        let e = cache
            .resolve(&host, array, "osi/test/Point", POINT, &Config::default())
            .err()
            .unwrap();
        assert!(matches!(e, Error::ClassNotFound { class: "osi/test/Point" }));
        assert!(!cache.is_resolved());

        host.define_class("osi/test/Point", &[("x", "I"), ("y", "I")]).unwrap();
        let e = cache
            .resolve(&host, array, "osi/test/Point", POINT, &Config::default())
            .err()
            .unwrap();
        assert!(matches!(e, Error::ClassMismatch { .. }));
    }

    // Types of the field must match, not only their names.
    #[test]
    fn resolve_descriptor_mismatch() {
        let host = MemoryHost::new();
        let class = host.define_class("osi/test/Point", &[("x", "I"), ("y", "J")]).unwrap();
        let cache = FieldCache::<MemoryHost>::new();

        let e = cache
            .resolve(&host, host.new_object(class), "osi/test/Point", POINT, &Config::default())
            .err()
            .unwrap();
        match e {
            Error::FieldNotFound { name, descriptor, .. } => {
                assert_eq!(name, "y");
                assert_eq!(descriptor, "I");
            },
            e => panic!("unexpected error: {}", e),
        }
    }
}
