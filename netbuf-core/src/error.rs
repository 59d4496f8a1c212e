use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Stable, machine-readable error codes for the buffer subsystem.
///
/// Codes follow the `<domain>.<reason>` convention so downstream logging and
/// metrics pipelines can aggregate on the string without parsing messages.
pub mod codes {
    pub const INDEX_OUT_OF_RANGE: &str = "buffer.index_out_of_range";
    pub const READ_ONLY: &str = "buffer.read_only";
    pub const BUFFER_CLOSED: &str = "buffer.closed";
    pub const NOT_OWNED: &str = "buffer.not_owned";
    pub const INVALID_COMPOSITION: &str = "buffer.invalid_composition";
    pub const ALLOCATION_FAILURE: &str = "buffer.allocation_failure";
    pub const SEND_CONSUMED: &str = "buffer.send_consumed";
    pub const UNSUPPORTED: &str = "buffer.unsupported";
}

/// Coarse dispatch category for a [`BufferError`], orthogonal to its stable code.
///
/// Callers that want to branch on "is this retryable" or "is this a caller bug"
/// without string-matching `code()` can match on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// A cursor or index fell outside the buffer's addressable range.
    Bounds,
    /// An operation required ownership the buffer did not hold (borrowed, closed, read-only).
    Ownership,
    /// A composite buffer could not be built from its components.
    Composition,
    /// The underlying allocator or memory manager could not satisfy a request.
    Allocation,
    /// A `Send` token was misused (double receive, discard races).
    Transfer,
    /// The requested feature is not available on this platform/build.
    Unsupported,
}

/// The single error type returned from every fallible operation in this crate family.
///
/// Mirrors a builder-style error with a stable code, a human message, an optional
/// boxed cause, and a coarse category — deliberately one struct rather than an enum
/// of variant structs, so adding context never breaks callers matching on `code()`.
#[derive(Debug)]
pub struct BufferError {
    code: &'static str,
    message: Cow<'static, str>,
    category: ErrorCategory,
    cause: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl BufferError {
    pub fn new(
        code: &'static str,
        category: ErrorCategory,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            category,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Out-of-bounds accessor, carrying the offending index and the buffer's
    /// current `[read_limit, write_limit]` window.
    pub fn index_out_of_range(index: usize, read_limit: usize, write_limit: usize) -> Self {
        Self::new(
            codes::INDEX_OUT_OF_RANGE,
            ErrorCategory::Bounds,
            format!(
                "index {index} out of range: read_limit={read_limit}, write_limit={write_limit}"
            ),
        )
    }

    pub fn read_only(op: &'static str) -> Self {
        Self::new(
            codes::READ_ONLY,
            ErrorCategory::Ownership,
            format!("buffer is read-only: cannot {op}"),
        )
    }

    pub fn buffer_closed(op: &'static str) -> Self {
        Self::new(
            codes::BUFFER_CLOSED,
            ErrorCategory::Ownership,
            format!("buffer is closed or inaccessible: cannot {op}"),
        )
    }

    pub fn not_owned(op: &'static str) -> Self {
        Self::new(
            codes::NOT_OWNED,
            ErrorCategory::Ownership,
            format!("operation requires sole ownership: cannot {op} a borrowed buffer"),
        )
    }

    pub fn invalid_composition(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::new(codes::INVALID_COMPOSITION, ErrorCategory::Composition, reason)
    }

    pub fn allocation_failure(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::new(codes::ALLOCATION_FAILURE, ErrorCategory::Allocation, reason)
    }

    pub fn send_consumed() -> Self {
        Self::new(
            codes::SEND_CONSUMED,
            ErrorCategory::Transfer,
            "send token has already been received or discarded",
        )
    }

    pub fn unsupported(feature: &'static str) -> Self {
        Self::new(
            codes::UNSUPPORTED,
            ErrorCategory::Unsupported,
            format!("feature not supported on this platform: {feature}"),
        )
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl StdError for BufferError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c.as_ref() as &(dyn StdError + 'static))
    }
}

pub type Result<T> = core::result::Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_out_of_range_embeds_bounds() {
        let err = BufferError::index_out_of_range(10, 2, 8);
        assert_eq!(err.code(), codes::INDEX_OUT_OF_RANGE);
        assert_eq!(err.category(), ErrorCategory::Bounds);
        assert!(err.message().contains("10"));
        assert!(err.message().contains("read_limit=2"));
    }

    #[test]
    fn display_includes_code_prefix() {
        let err = BufferError::read_only("write_u8");
        assert_eq!(format!("{err}"), "[buffer.read_only] buffer is read-only: cannot write_u8");
    }
}
