use std::collections::BTreeMap;
use std::fmt;

use ghd_core::errors::{ErrorInfo, SearchError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Variant-tagged capture of a generator's or predicate's full state.
///
/// `state` is the `bincode` encoding of the strategy value; the tag selects
/// the decoder that turns it back into a live object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    tag: String,
    state: Vec<u8>,
}

impl Snapshot {
    /// Encodes `state` under the given variant tag.
    pub fn capture<S: Serialize>(tag: &str, state: &S) -> Result<Self, SearchError> {
        let state = bincode::serialize(state).map_err(|err| {
            SearchError::Decode(
                ErrorInfo::new("snapshot-encode", err.to_string()).with_context("tag", tag),
            )
        })?;
        Ok(Self {
            tag: tag.to_owned(),
            state,
        })
    }

    /// Decodes the captured state as `S`.
    pub fn restore<S: DeserializeOwned>(&self) -> Result<S, SearchError> {
        bincode::deserialize(&self.state).map_err(|err| {
            SearchError::Decode(
                ErrorInfo::new("snapshot-decode", err.to_string()).with_context("tag", &self.tag),
            )
        })
    }

    /// Variant tag of the captured strategy.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Size of the encoded state in bytes.
    pub fn state_len(&self) -> usize {
        self.state.len()
    }
}

/// Function turning a snapshot back into a live trait object.
pub type Decoder<T> = fn(&Snapshot) -> Result<Box<T>, SearchError>;

/// Tag-keyed decoder table for one family of wire variants.
///
/// A variant may only travel on the wire once its tag is registered here;
/// restoring an unknown tag is a hard decode failure.
pub struct Registry<T: ?Sized> {
    family: &'static str,
    decoders: BTreeMap<String, Decoder<T>>,
}

impl<T: ?Sized> Registry<T> {
    /// Creates an empty registry for the named family (used in diagnostics).
    pub fn new(family: &'static str) -> Self {
        Self {
            family,
            decoders: BTreeMap::new(),
        }
    }

    /// Registers a decoder under `tag`. Tags must be unique.
    pub fn register(&mut self, tag: &str, decoder: Decoder<T>) -> Result<&mut Self, SearchError> {
        if self.decoders.contains_key(tag) {
            return Err(SearchError::Config(
                ErrorInfo::new("duplicate-tag", "variant tag registered twice")
                    .with_context("family", self.family)
                    .with_context("tag", tag),
            ));
        }
        self.decoders.insert(tag.to_owned(), decoder);
        Ok(self)
    }

    /// Fails unless `tag` is registered.
    pub fn ensure_registered(&self, tag: &str) -> Result<(), SearchError> {
        if self.decoders.contains_key(tag) {
            Ok(())
        } else {
            Err(self.unknown(tag))
        }
    }

    /// Recreates the live object captured by `snapshot`.
    pub fn restore(&self, snapshot: &Snapshot) -> Result<Box<T>, SearchError> {
        let decoder = self
            .decoders
            .get(snapshot.tag())
            .ok_or_else(|| self.unknown(snapshot.tag()))?;
        decoder(snapshot)
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.decoders.keys().map(String::as_str)
    }

    fn unknown(&self, tag: &str) -> SearchError {
        SearchError::Decode(
            ErrorInfo::new("unknown-tag", "variant tag is not registered")
                .with_context("family", self.family)
                .with_context("tag", tag)
                .with_hint("register the strategy before it appears on the wire"),
        )
    }
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            family: self.family,
            decoders: self.decoders.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("family", &self.family)
            .field("tags", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}
