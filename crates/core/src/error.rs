//! Error taxonomy shared across the gateway.
//!
//! Every fault that can reach a session boundary is mapped into one of the
//! variants below (see the error handling design in the specification).
//! `TransportClose` is deliberately absent: a normal disconnect is not an
//! error and carries no user-visible message.

use thiserror::Error;

/// Errors that can be reported to a client or surfaced at the HTTP boundary.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// Malformed message, unknown filename, unsupported extension, missing field.
    #[error("{message}")]
    Validation {
        /// Human-readable description of what was malformed.
        message: String,
    },

    /// Seed not found, seed marked unsafe, or a hash mismatch.
    #[error("{message}")]
    Integrity {
        /// Human-readable description of the integrity failure.
        message: String,
    },

    /// Out-of-memory while constructing the engine; retried once, then surfaced.
    #[error("out of memory while loading model: {message}")]
    ResourceExhaustion {
        /// Details from the underlying construction failure.
        message: String,
    },

    /// A runtime failure whose message matches the accelerator-fault heuristic.
    #[error("accelerator fault: {message}")]
    AcceleratorFault {
        /// The raw error message that triggered the heuristic.
        message: String,
    },

    /// An unexpected failure not covered by the other variants.
    #[error("internal error: {message}")]
    FatalInternal {
        /// Description of the unexpected failure.
        message: String,
    },
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity { message: message.into() }
    }

    pub fn resource_exhaustion(message: impl Into<String>) -> Self {
        Self::ResourceExhaustion { message: message.into() }
    }

    pub fn accelerator_fault(message: impl Into<String>) -> Self {
        Self::AcceleratorFault { message: message.into() }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::FatalInternal { message: message.into() }
    }

    /// HTTP status code this error maps to at the HTTP boundary (§7).
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Integrity { .. } => 403,
            Self::ResourceExhaustion { .. } | Self::AcceleratorFault { .. } | Self::FatalInternal { .. } => 500,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
