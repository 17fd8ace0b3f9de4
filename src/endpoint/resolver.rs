//! Per-call target resolution.
//!
//! Precedence, first match wins:
//! 1. a call-scoped address supplied with the query
//! 2. the session's default target
//! 3. nothing

use super::EndpointDescriptor;
use crate::error::AddressFormatError;

/// Where a query should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The query named its own target; configured sources are bypassed.
    CallScoped(EndpointDescriptor),
    /// The session's default target applies.
    SessionDefault(EndpointDescriptor),
    /// No target is configured. Callers turn this into setup guidance.
    Unconfigured,
}

impl Resolution {
    /// The authoritative descriptor, if any.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&EndpointDescriptor> {
        match self {
            Self::CallScoped(descriptor) | Self::SessionDefault(descriptor) => Some(descriptor),
            Self::Unconfigured => None,
        }
    }

    /// Whether the query carried its own target.
    #[must_use]
    pub const fn is_call_scoped(&self) -> bool {
        matches!(self, Self::CallScoped(_))
    }
}

/// Decides which configured target is authoritative for a call.
pub struct TargetResolver;

impl TargetResolver {
    /// Resolve the target for a single call.
    ///
    /// An empty or whitespace-only call argument counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AddressFormatError`] when a call-scoped address is supplied
    /// but malformed. A malformed override is never skipped in favour of the
    /// session default.
    pub fn resolve(
        call_arg: Option<&str>,
        session_default: Option<&EndpointDescriptor>,
    ) -> Result<Resolution, AddressFormatError> {
        if let Some(address) = call_arg.filter(|value| !value.trim().is_empty()) {
            return EndpointDescriptor::parse(address).map(Resolution::CallScoped);
        }

        Ok(session_default.map_or(Resolution::Unconfigured, |descriptor| {
            Resolution::SessionDefault(descriptor.clone())
        }))
    }
}
