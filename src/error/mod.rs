//! Error types for async-snmp-agent.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type for local callers of the agent API
//! - [`ErrorStatus`] - SNMP protocol errors carried in response PDUs (RFC 3416)
//!
//! The two are deliberately separate: [`ErrorStatus`] values travel back to
//! the remote manager on the wire, while [`Error`] values stay on this host.
//! A malformed datagram, for example, surfaces locally as
//! [`Error::MalformedMessage`] and produces no response at all.
//!
//! # Error Handling
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! ```rust
//! use async_snmp_agent::{Error, Result};
//!
//! fn handle_error(result: Result<()>) {
//!     match result {
//!         Ok(()) => println!("Success"),
//!         Err(e) => match &*e {
//!             Error::Network { addr, source } => {
//!                 println!("socket failure on {}: {}", addr, source);
//!             }
//!             Error::Auth { source } => {
//!                 println!("bad community from {}", source);
//!             }
//!             _ => println!("Error: {}", e),
//!         }
//!     }
//! }
//! ```

pub(crate) mod internal;

use std::net::SocketAddr;

use crate::oid::Oid;

/// Placeholder peer address used when no peer is known.
///
/// This sentinel value (0.0.0.0:0) is used in error contexts where the
/// peer address cannot be determined (e.g., parsing failures in code
/// that never sees the datagram's source address).
pub(crate) const UNKNOWN_PEER: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)), 0);

// Pattern for converting detailed internal errors to simplified public errors:
//
// tracing::debug!(
//     target: "async_snmp_agent::ber",
//     { snmp.offset = 42, snmp.decode_error = "ZeroLengthInteger" },
//     "decode error details here"
// );
// return Err(Error::MalformedMessage { source }.boxed());

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The main error type for all async-snmp-agent operations.
///
/// This covers everything reported to the local caller: socket failures,
/// malformed or unauthenticated inbound messages, configuration mistakes.
/// Nothing in this enum is ever sent on the wire; protocol-visible errors
/// are [`ErrorStatus`] values inside a response PDU.
///
/// Errors are boxed (via [`Result`]) to keep the size small on the stack.
// Display and std::error::Error are implemented by hand (rather than via
// thiserror's derive) because several variants use a `source: SocketAddr`
// field to mean "peer address", which the derive would misinterpret as the
// error cause.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Network failure (bind, send, or receive).
    Network {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Inbound message could not be parsed.
    MalformedMessage { source: SocketAddr },

    /// Inbound message carried an SNMP version this agent does not serve.
    UnsupportedVersion { source: SocketAddr, version: i32 },

    /// Community authentication failed.
    Auth { source: SocketAddr },

    /// Encoded message exceeds the configured maximum size.
    MessageTooLarge { size: usize, max: usize },

    /// A handler is already registered for this exact prefix.
    DuplicateRegistration { prefix: Oid },

    /// Invalid configuration.
    Config(Box<str>),

    /// Invalid OID format.
    InvalidOid(Box<str>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network { addr, source } => {
                write!(f, "network error on {addr}: {source}")
            }
            Self::MalformedMessage { source } => {
                write!(f, "malformed message from {source}")
            }
            Self::UnsupportedVersion { source, version } => {
                write!(f, "unsupported SNMP version {version} from {source}")
            }
            Self::Auth { source } => write!(f, "authentication failed for {source}"),
            Self::MessageTooLarge { size, max } => {
                write!(f, "message too large: {size} bytes exceeds maximum {max}")
            }
            Self::DuplicateRegistration { prefix } => {
                write!(f, "handler already registered at {prefix}")
            }
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidOid(msg) => write!(f, "invalid OID: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub(crate) fn config(msg: impl Into<Box<str>>) -> Box<Self> {
        Self::Config(msg.into()).boxed()
    }

    pub(crate) fn invalid_oid(kind: internal::OidErrorKind) -> Box<Self> {
        Self::InvalidOid(kind.to_string().into()).boxed()
    }
}

/// SNMP protocol error status codes (RFC 3416).
///
/// These are the codes an agent places in the error-status field of a
/// GetResponse, paired with a 1-based error-index naming the varbind
/// that failed. Handler callbacks return them to reject an operation;
/// per RFC 3416 the first failing varbind aborts the rest of the PDU.
///
/// # Error Categories
///
/// ## SNMPv1 Errors (0-5)
///
/// - `NoError` - Operation succeeded
/// - `TooBig` - Response too large for transport
/// - `NoSuchName` - OID not found (v1 only; v2c uses exception values)
/// - `BadValue` - Invalid value in SET
/// - `ReadOnly` - Attempted write to read-only object
/// - `GenErr` - Unspecified error
///
/// ## SNMPv2c Errors (6-18)
///
/// These provide more specific error information for SET operations:
///
/// - `NoAccess` - Object not accessible (access control)
/// - `WrongType` - Value has wrong ASN.1 type
/// - `WrongLength` - Value has wrong length
/// - `WrongValue` - Value out of range or invalid
/// - `NoCreation` - Instance cannot be created
/// - `NotWritable` - Object does not support SET
/// - `AuthorizationError` - Access denied
///
/// # Example
///
/// ```
/// use async_snmp_agent::ErrorStatus;
///
/// let status = ErrorStatus::from_i32(2);
/// assert_eq!(status, ErrorStatus::NoSuchName);
/// assert_eq!(status.as_i32(), 2);
/// println!("Error: {}", status); // prints "noSuchName"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    /// Operation completed successfully (status = 0).
    NoError,
    /// Response message would be too large for transport (status = 1).
    TooBig,
    /// Requested OID not found (status = 2). SNMPv1 only; v2c uses exception values.
    NoSuchName,
    /// Invalid value provided in SET request (status = 3).
    BadValue,
    /// Attempted to SET a read-only object (status = 4).
    ReadOnly,
    /// Unspecified error occurred (status = 5).
    GenErr,
    /// Object exists but access is denied (status = 6).
    NoAccess,
    /// SET value has wrong ASN.1 type (status = 7).
    WrongType,
    /// SET value has incorrect length (status = 8).
    WrongLength,
    /// SET value uses wrong encoding (status = 9).
    WrongEncoding,
    /// SET value is out of range or otherwise invalid (status = 10).
    WrongValue,
    /// Object does not support instance creation (status = 11).
    NoCreation,
    /// Value is inconsistent with other managed objects (status = 12).
    InconsistentValue,
    /// Resource required for SET is unavailable (status = 13).
    ResourceUnavailable,
    /// SET commit phase failed (status = 14).
    CommitFailed,
    /// SET undo phase failed (status = 15).
    UndoFailed,
    /// Access denied by the community's permission rules (status = 16).
    AuthorizationError,
    /// Object does not support modification (status = 17).
    NotWritable,
    /// Named object cannot be created (status = 18).
    InconsistentName,
    /// Unknown or future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => {
                tracing::warn!(target: "async_snmp_agent::error", { snmp.error_status = other }, "unknown SNMP error status");
                Self::Unknown(other)
            }
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }

    /// Map v2c-only codes down to the RFC 2576 Section 4.3 equivalents
    /// an SNMPv1 manager understands (codes 0-5).
    pub fn downgrade_for_v1(&self) -> Self {
        match self {
            Self::NoError
            | Self::TooBig
            | Self::NoSuchName
            | Self::BadValue
            | Self::ReadOnly
            | Self::GenErr => *self,
            Self::WrongType
            | Self::WrongLength
            | Self::WrongEncoding
            | Self::WrongValue
            | Self::InconsistentValue => Self::BadValue,
            Self::NoAccess
            | Self::AuthorizationError
            | Self::NotWritable
            | Self::NoCreation
            | Self::InconsistentName => Self::NoSuchName,
            Self::ResourceUnavailable | Self::CommitFailed | Self::UndoFailed => Self::GenErr,
            Self::Unknown(_) => Self::GenErr,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}
