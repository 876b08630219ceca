//! # Configuration
//!
//! Per-library marshalling configuration. Every [`LibraryGlobals`] block
//! carries its own configuration, so libraries built for different mirror
//! layouts can be resident in the same process.
//!
//! Configuration can be assembled in code, parsed from JSON, or taken from
//! the environment. Missing keys are filled in with defaults.
//!
//! [`LibraryGlobals`]: crate::globals::LibraryGlobals

use crate::error::{Error, Result};
use crate::sig::Primitive;

/// Environment variable consulted by [`Config::from_env()`].
pub const ENV_POINTER: &str = "OSI_MARSHAL_POINTER";

/// ## Pointer Representation
///
/// Mirror classes carry native pointers as integers. Depending on how the
/// mirror classes were generated, this is either a 32-bit `int` or a 64-bit
/// `long` field.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerRepr {
    Int,
    Long,
}

/// ## Marshalling Configuration
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Mirror representation of native pointers.
    pub pointer: PointerRepr,
}

impl PointerRepr {
    /// Representation matching the pointer width of the compilation target.
    #[cfg(target_pointer_width = "32")]
    pub const NATIVE: Self = PointerRepr::Int;
    /// Representation matching the pointer width of the compilation target.
    #[cfg(target_pointer_width = "64")]
    pub const NATIVE: Self = PointerRepr::Long;

    /// Host primitive used for the representation.
    pub const fn primitive(self) -> Primitive {
        match self {
            PointerRepr::Int => Primitive::Int,
            PointerRepr::Long => Primitive::Long,
        }
    }

    fn parse(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "int" | "32" => Some(PointerRepr::Int),
            "long" | "64" => Some(PointerRepr::Long),
            _ => None,
        }
    }
}

impl Default for PointerRepr {
    fn default() -> Self {
        Self::NATIVE
    }
}

impl Config {
    /// ## Parse JSON Configuration
    ///
    /// Parse configuration from a JSON object. Unknown keys are rejected,
    /// missing keys take their default.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| Error::Config(e.to_string()))
    }

    /// ## Configuration from Environment
    ///
    /// Start from the defaults and apply overrides from the process
    /// environment. `OSI_MARSHAL_POINTER` accepts `int`, `long`, `32`, or
    /// `64`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_POINTER) {
            config.pointer = PointerRepr::parse(&v).ok_or_else(|| {
                Error::Config(format!("{}: unknown pointer representation `{}`", ENV_POINTER, v))
            })?;
        }

        Ok(config)
    }
}
