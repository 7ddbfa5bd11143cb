//! Payload types held by the bounded stores

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use thiserror::Error;

/// Severity of a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MsgKind {
    #[default]
    Normal,
    Info,
    Warning,
    Critical,
}

impl MsgKind {
    pub const ALL: [MsgKind; 4] = [
        MsgKind::Normal,
        MsgKind::Info,
        MsgKind::Warning,
        MsgKind::Critical,
    ];

    /// One-letter tag used in persisted lines
    pub fn tag(self) -> char {
        match self {
            MsgKind::Normal => 'N',
            MsgKind::Info => 'I',
            MsgKind::Warning => 'W',
            MsgKind::Critical => 'C',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MsgKind::Normal => "normal",
            MsgKind::Info => "info",
            MsgKind::Warning => "warning",
            MsgKind::Critical => "critical",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for MsgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown message kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for MsgKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "n" => Ok(MsgKind::Normal),
            "info" | "i" => Ok(MsgKind::Info),
            "warning" | "warn" | "w" => Ok(MsgKind::Warning),
            "critical" | "c" => Ok(MsgKind::Critical),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// A set of [`MsgKind`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        MsgKind::ALL.into_iter().collect()
    }

    pub fn with(self, kind: MsgKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub fn union(self, other: KindSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn contains(self, kind: MsgKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = MsgKind> {
        MsgKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl From<MsgKind> for KindSet {
    fn from(kind: MsgKind) -> Self {
        KindSet::empty().with(kind)
    }
}

impl FromIterator<MsgKind> for KindSet {
    fn from_iter<I: IntoIterator<Item = MsgKind>>(iter: I) -> Self {
        iter.into_iter().fold(KindSet::empty(), KindSet::with)
    }
}

impl BitOr for KindSet {
    type Output = KindSet;

    fn bitor(self, rhs: KindSet) -> KindSet {
        self.union(rhs)
    }
}

impl BitOr<MsgKind> for KindSet {
    type Output = KindSet;

    fn bitor(self, rhs: MsgKind) -> KindSet {
        self.with(rhs)
    }
}

impl BitOr for MsgKind {
    type Output = KindSet;

    fn bitor(self, rhs: MsgKind) -> KindSet {
        KindSet::from(self).with(rhs)
    }
}

/// A message accepted by the main log store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub kind: MsgKind,
    /// Unix seconds
    pub timestamp: i64,
    pub text: String,
}

/// A connection ban (or ban attempt) recorded by the peer store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEvent {
    pub id: i64,
    pub blocked: bool,
    pub timestamp: i64,
    pub address: String,
    pub reason: String,
}
