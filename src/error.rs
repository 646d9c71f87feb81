//! Error and warning types shared by every stage of the remapping pipeline.
//!
//! Every error is scoped to a single class file. The batch orchestrator
//! records them in the report instead of aborting the run.

use std::fmt;

use thiserror::Error;

/// Result type alias for remapping operations
pub type Result<T> = std::result::Result<T, RemapError>;

/// Structural place inside a class file where a problem was found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Location {
    /// No more precise location is known.
    #[default]
    Unknown,
    /// this_class, super_class or the interfaces table.
    ClassHeader,
    /// A constant pool entry.
    Pool(u16),
    /// A field declaration.
    Field { name: String, descriptor: String },
    /// A method declaration.
    Method { name: String, descriptor: String },
    /// An attribute, optionally nested in a member (`owner` is "name descriptor").
    Attribute { name: String, owner: Option<String> },
    /// An instruction inside a method body.
    Code { method: String, offset: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => write!(f, "unknown location"),
            Location::ClassHeader => write!(f, "class header"),
            Location::Pool(index) => write!(f, "constant pool #{index}"),
            Location::Field { name, descriptor } => write!(f, "field {name}:{descriptor}"),
            Location::Method { name, descriptor } => write!(f, "method {name}{descriptor}"),
            Location::Attribute { name, owner: None } => write!(f, "attribute {name}"),
            Location::Attribute {
                name,
                owner: Some(owner),
            } => write!(f, "attribute {name} of {owner}"),
            Location::Code { method, offset } => write!(f, "code of {method} at offset {offset}"),
        }
    }
}

/// Errors raised while reading, remapping or writing a class file.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RemapError {
    /// The input is not a well-formed class file.
    #[error("malformed class file{}: {reason}", .offset.map(|o| format!(" at offset {o}")).unwrap_or_default())]
    MalformedClassFile {
        /// Byte offset of the problem when known
        offset: Option<u64>,
        /// What was wrong
        reason: String,
    },

    /// A constant pool index is zero, out of range, the second half of a
    /// Long/Double, or points at an entry of the wrong kind.
    #[error("invalid constant pool index {index} ({location})")]
    InvalidPoolIndex {
        /// The offending index
        index: u16,
        /// Where it was referenced from
        location: Location,
    },

    /// A descriptor or generic signature does not follow the JVM grammar.
    #[error("unresolvable descriptor '{descriptor}' ({location})")]
    UnresolvableDescriptor {
        /// The text that failed to parse
        descriptor: String,
        /// Where it was referenced from
        location: Location,
    },

    /// Interning would grow the constant pool past 65535 slots.
    #[error("constant pool overflow: cannot grow past {slots} slots")]
    ConstantPoolOverflow {
        /// Slot count at the time of the failure
        slots: usize,
    },

    /// A mapping text could not be parsed.
    #[error("invalid mapping at line {line}: {reason}")]
    Mapping {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },
}

impl RemapError {
    /// Creates a new malformed class file error
    pub fn malformed(offset: Option<u64>, reason: impl Into<String>) -> Self {
        Self::MalformedClassFile {
            offset,
            reason: reason.into(),
        }
    }

    /// Creates a new invalid pool index error with no location yet
    pub fn invalid_index(index: u16) -> Self {
        Self::InvalidPoolIndex {
            index,
            location: Location::Unknown,
        }
    }

    /// Creates a new descriptor error with no location yet
    pub fn descriptor(descriptor: impl Into<String>) -> Self {
        Self::UnresolvableDescriptor {
            descriptor: descriptor.into(),
            location: Location::Unknown,
        }
    }

    /// Creates a new mapping parse error
    pub fn mapping(line: usize, reason: impl Into<String>) -> Self {
        Self::Mapping {
            line,
            reason: reason.into(),
        }
    }

    /// Attaches a location unless a more precise one was already recorded.
    pub fn at(mut self, at: Location) -> Self {
        match &mut self {
            Self::InvalidPoolIndex { location, .. }
            | Self::UnresolvableDescriptor { location, .. } => {
                if *location == Location::Unknown {
                    *location = at;
                }
            }
            _ => {}
        }
        self
    }

    /// The structural location of the error, if it carries one.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::InvalidPoolIndex { location, .. }
            | Self::UnresolvableDescriptor { location, .. } => Some(location),
            _ => None,
        }
    }

    /// Short stable name of the error kind, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedClassFile { .. } => "MalformedClassFile",
            Self::InvalidPoolIndex { .. } => "InvalidPoolIndex",
            Self::UnresolvableDescriptor { .. } => "UnresolvableDescriptor",
            Self::ConstantPoolOverflow { .. } => "ConstantPoolOverflow",
            Self::Mapping { .. } => "Mapping",
        }
    }
}

impl From<csv::Error> for RemapError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map_or(0, |p| p.line() as usize);
        Self::mapping(line, e.to_string())
    }
}

impl From<binrw::Error> for RemapError {
    fn from(e: binrw::Error) -> Self {
        match e {
            binrw::Error::BadMagic { pos, .. } => {
                Self::malformed(Some(pos), "bad magic number, expected 0xCAFEBABE")
            }
            binrw::Error::AssertFail { pos, message } => Self::malformed(Some(pos), message),
            binrw::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Self::malformed(None, "unexpected end of input")
            }
            other => Self::malformed(None, other.to_string()),
        }
    }
}

/// Non-fatal conditions observed while remapping a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingWarning {
    /// Several interfaces in the hierarchy map the same member to different
    /// names; `chosen` won because it comes first in walk order.
    AmbiguousMapping {
        owner: String,
        name: String,
        descriptor: String,
        chosen: String,
        chosen_from: String,
        rejected: Vec<(String, String)>,
    },
}

impl fmt::Display for MappingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingWarning::AmbiguousMapping {
                owner,
                name,
                descriptor,
                chosen,
                chosen_from,
                rejected,
            } => {
                write!(
                    f,
                    "ambiguous mapping for {owner}.{name}{descriptor}: chose '{chosen}' from {chosen_from}"
                )?;
                for (from, target) in rejected {
                    write!(f, ", ignored '{target}' from {from}")?;
                }
                Ok(())
            }
        }
    }
}
