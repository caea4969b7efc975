// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Label sequences, wire-format names, and the suffix hierarchy.
//!
//! A name is an ordered list of labels, most specific first: `a.b.eth` is
//! `["a", "b", "eth"]`. The hierarchy of a name is the list of ids of every
//! suffix, from the full name down to the root. Ancestry is never stored as a
//! tree; it is recomputed from the labels on every request.
//!
//! # Wire form
//!
//! Names travel as DNS-style length-prefixed labels terminated by a zero
//! byte. The root name is the single byte `00`.

use std::fmt;
use std::iter::FusedIterator;

use thiserror::Error;

use crate::ident::{NodeId, ROOT_NODE_ID};

/// Maximum label length representable by a one-byte length prefix.
pub const MAX_LABEL_LEN: usize = 63;

/// Framing errors raised while decoding a wire-format name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    /// The input ended before the terminating zero-length label.
    #[error("name is missing its terminating root label")]
    Unterminated,
    /// A length prefix points past the end of the input.
    #[error("label at byte {offset} claims {len} bytes but only {available} remain")]
    TruncatedLabel {
        /// Byte offset of the length prefix.
        offset: usize,
        /// Declared label length.
        len: usize,
        /// Bytes remaining after the prefix.
        available: usize,
    },
    /// Bytes follow the terminating root label.
    #[error("{0} trailing bytes after the root label")]
    TrailingBytes(usize),
    /// A label longer than [`MAX_LABEL_LEN`].
    #[error("label of {0} bytes exceeds the 63 byte limit")]
    LabelTooLong(usize),
    /// An empty label inside a dotted name (e.g. `a..eth`).
    #[error("empty label in dotted name")]
    EmptyLabel,
}

/// An immutable, decoded name: labels ordered most specific first.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Labels {
    labels: Vec<Box<[u8]>>,
}

impl Labels {
    /// The root name (no labels).
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a presentation-form name such as `a.b.eth`.
    ///
    /// The empty string and `"."` are the root name. A single trailing dot is
    /// accepted.
    pub fn from_dotted(name: &str) -> Result<Self, NameError> {
        let trimmed = name.strip_suffix('.').unwrap_or(name);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut labels = Vec::new();
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LabelTooLong(label.len()));
            }
            labels.push(Box::from(label.as_bytes()));
        }
        Ok(Self { labels })
    }

    /// Builds a name from raw labels (most specific first).
    pub fn from_labels<I, L>(labels: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut out = Vec::new();
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() {
                return Err(NameError::EmptyLabel);
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(NameError::LabelTooLong(label.len()));
            }
            out.push(Box::from(label));
        }
        Ok(Self { labels: out })
    }

    /// Number of labels (0 for the root name).
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` for the root name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates labels, most specific first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator {
        self.labels.iter().map(AsRef::as_ref)
    }

    /// Returns the top-level label (`eth` in `a.b.eth`), if any.
    #[must_use]
    pub fn top_level_label(&self) -> Option<&[u8]> {
        self.labels.last().map(AsRef::as_ref)
    }

    /// Encodes the name in wire form.
    #[must_use]
    pub fn to_wire(&self) -> Vec<u8> {
        let framed: usize = self.labels.iter().map(|l| l.len() + 1).sum();
        let mut out = Vec::with_capacity(framed + 1);
        for label in &self.labels {
            // Every constructor bounds labels to a one-byte length.
            #[allow(clippy::cast_possible_truncation)]
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
        out
    }

    /// Computes the id of this name and of every ancestor.
    #[must_use]
    pub fn hierarchy(&self) -> Hierarchy {
        Hierarchy::new(self)
    }

    /// Returns `true` if [`Display`](fmt::Display) output parses back to the
    /// same labels: every label is UTF-8 and free of `.`.
    #[must_use]
    pub fn is_dotted(&self) -> bool {
        self.labels
            .iter()
            .all(|l| !l.contains(&b'.') && std::str::from_utf8(l).is_ok())
    }

    /// Shorthand for `self.hierarchy().node()`.
    #[must_use]
    pub fn namehash(&self) -> NodeId {
        self.labels
            .iter()
            .rev()
            .fold(ROOT_NODE_ID, |parent, label| parent.child(label))
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&String::from_utf8_lossy(label))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Labels({self})")
    }
}

/// Serialized form of [`Labels`]: dotted text when that is lossless,
/// otherwise `{ "wire": "0x.." }`.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
enum LabelsRepr {
    Dotted(String),
    Wire { wire: String },
}

#[cfg(feature = "serde")]
impl serde::Serialize for Labels {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if self.is_dotted() {
            return serializer.collect_str(self);
        }
        let wire = format!("0x{}", hex::encode(self.to_wire()));
        serde::Serialize::serialize(&LabelsRepr::Wire { wire }, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Labels {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;
        match <LabelsRepr as serde::Deserialize<'de>>::deserialize(deserializer)? {
            LabelsRepr::Dotted(s) => Self::from_dotted(&s).map_err(D::Error::custom),
            LabelsRepr::Wire { wire } => {
                let digits = wire.strip_prefix("0x").unwrap_or(&wire);
                let bytes = hex::decode(digits).map_err(D::Error::custom)?;
                decode_name(&bytes).map_err(D::Error::custom)
            }
        }
    }
}

/// Encodes a presentation-form name into wire form.
pub fn encode_name(name: &str) -> Result<Vec<u8>, NameError> {
    Labels::from_dotted(name).map(|labels| labels.to_wire())
}

/// Decodes a wire-format name.
///
/// # Errors
///
/// Returns a [`NameError`] for any framing violation: a length prefix past the
/// end of input, a label over [`MAX_LABEL_LEN`], a missing terminator, or
/// bytes after the terminator.
pub fn decode_name(wire: &[u8]) -> Result<Labels, NameError> {
    let mut labels = Vec::new();
    let mut offset = 0;
    loop {
        let Some(&len) = wire.get(offset) else {
            return Err(NameError::Unterminated);
        };
        let len = usize::from(len);
        if len == 0 {
            let rest = wire.len() - offset - 1;
            if rest != 0 {
                return Err(NameError::TrailingBytes(rest));
            }
            return Ok(Labels { labels });
        }
        if len > MAX_LABEL_LEN {
            return Err(NameError::LabelTooLong(len));
        }
        let start = offset + 1;
        let available = wire.len() - start;
        if len > available {
            return Err(NameError::TruncatedLabel {
                offset,
                len,
                available,
            });
        }
        labels.push(Box::from(&wire[start..start + len]));
        offset = start + len;
    }
}

/// Ids of a name and all of its ancestors.
///
/// Computed once per request. `ids[k]` is the id of the suffix starting at
/// label `k`; the final entry is always [`ROOT_NODE_ID`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    ids: Vec<NodeId>,
}

impl Hierarchy {
    fn new(labels: &Labels) -> Self {
        let mut ids = vec![ROOT_NODE_ID; labels.len() + 1];
        for (k, label) in labels.labels.iter().enumerate().rev() {
            ids[k] = ids[k + 1].child(label);
        }
        Self { ids }
    }

    /// Id of the full name.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.ids[0]
    }

    /// Number of labels in the underlying name.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ids.len() - 1
    }

    /// Id of the top-level ancestor (`eth` for `a.b.eth`); `None` for the root.
    #[must_use]
    pub fn top_level(&self) -> Option<NodeId> {
        self.depth().checked_sub(1).map(|k| self.ids[k])
    }

    /// Id of the suffix starting at label `offset`; offsets past the end
    /// resolve to the root.
    #[must_use]
    pub fn suffix(&self, offset: usize) -> NodeId {
        self.ids.get(offset).copied().unwrap_or(ROOT_NODE_ID)
    }

    /// Every `(offset, id)` pair from the full name to the root.
    pub fn suffixes(&self) -> Suffixes<'_> {
        self.suffixes_from(0)
    }

    /// Like [`suffixes`](Self::suffixes) but starting at label `offset`.
    pub fn suffixes_from(&self, offset: usize) -> Suffixes<'_> {
        let start = offset.min(self.depth());
        Suffixes {
            ids: &self.ids[start..],
            offset: start,
        }
    }
}

/// Iterator over `(offset, NodeId)` pairs, most specific first.
#[derive(Clone, Debug)]
pub struct Suffixes<'a> {
    ids: &'a [NodeId],
    offset: usize,
}

impl Iterator for Suffixes<'_> {
    type Item = (usize, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let (first, rest) = self.ids.split_first()?;
        let item = (self.offset, *first);
        self.ids = rest;
        self.offset += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.ids.len(), Some(self.ids.len()))
    }
}

impl DoubleEndedIterator for Suffixes<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let (last, rest) = self.ids.split_last()?;
        self.ids = rest;
        Some((self.offset + rest.len(), *last))
    }
}

impl ExactSizeIterator for Suffixes<'_> {}
impl FusedIterator for Suffixes<'_> {}
