//! `Opt<T>`: a value that remembers whether it was ever set.
//!
//! Plain `Option<T>` cannot tell "the key was absent" from "the key was
//! explicitly `null`". `Opt` can: with `#[serde(default)]`, an absent field
//! stays [`Opt::Unset`] while an explicit `null` becomes `Set(T::default())`.
//!
//! ```
//! use serde::Deserialize;
//! use transfig::Opt;
//!
//! #[derive(Deserialize)]
//! struct Limits {
//!     #[serde(default)]
//!     retries: Opt<u32>,
//! }
//!
//! let absent: Limits = serde_json::from_str("{}").unwrap();
//! let null: Limits = serde_json::from_str(r#"{"retries": null}"#).unwrap();
//! assert_eq!(absent.retries, Opt::Unset);
//! assert_eq!(null.retries, Opt::Set(0));
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TransfigError;
use crate::types::Tree;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Opt<T> {
    #[default]
    Unset,
    Set(T),
}

impl<T> Opt<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Opt::Set(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Opt::Set(value) => Some(value),
            Opt::Unset => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Opt::Set(value) => Some(value),
            Opt::Unset => None,
        }
    }

    /// The carried value, or `fallback`.
    pub fn value_or_fallback(self, fallback: T) -> T {
        self.into_option().unwrap_or(fallback)
    }
}

impl<T: Default> Opt<T> {
    /// The carried value, or whatever `fallback` holds (its zero value when
    /// it is unset too).
    pub fn opt_or_fallback(self, fallback: Opt<T>) -> T {
        match self {
            Opt::Set(value) => value,
            Opt::Unset => fallback.into_option().unwrap_or_default(),
        }
    }

    /// The carried value, else the fallback's value, else `T::default()`.
    pub fn opt_or_empty(self, fallback: Opt<T>) -> T {
        self.into_option()
            .or_else(|| fallback.into_option())
            .unwrap_or_default()
    }
}

impl<T: DeserializeOwned + Default> Opt<T> {
    /// Decode a raw tree value: `None` is absence, `null` is an explicit
    /// zero, anything else is deserialized into `T`.
    pub fn decode(raw: Option<&Tree>) -> Result<Self, TransfigError> {
        match raw {
            None => Ok(Opt::Unset),
            Some(Tree::Null) => Ok(Opt::Set(T::default())),
            Some(value) => Ok(Opt::Set(T::deserialize(value)?)),
        }
    }
}

impl<T> From<Option<T>> for Opt<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Opt::Set(value),
            None => Opt::Unset,
        }
    }
}

impl<T> From<Opt<T>> for Option<T> {
    fn from(value: Opt<T>) -> Self {
        value.into_option()
    }
}

impl<T: Serialize> Serialize for Opt<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Opt::Set(value) => value.serialize(serializer),
            Opt::Unset => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for Opt<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<T>::deserialize(deserializer)?;
        Ok(Opt::Set(value.unwrap_or_default()))
    }
}
