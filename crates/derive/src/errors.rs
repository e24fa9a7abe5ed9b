//! Error types for the Espresso derivation core, sorted by severity.

use alloc::string::String;

/// A result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineErrorKind>;

/// A top level filter for [PipelineError] that sorts by severity.
#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// A temporary error. The operation may be retried and is expected to
    /// eventually succeed. The batch verifier maps these to an `Undecided`
    /// outcome; the sequencer backs off and retries.
    #[display("Temporary error: {_0}")]
    Temporary(PipelineError),
    /// A critical error. Propagates to the host and terminates the core.
    #[display("Critical error: {_0}")]
    Critical(PipelineError),
    /// A reset error. The L1 chain the L2 head references is no longer
    /// canonical; derivation must be reset before sequencing can continue.
    #[display("Pipeline reset: {_0}")]
    Reset(ResetError),
}

impl PipelineErrorKind {
    /// Returns if the error is temporary.
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    /// Returns if the error is critical.
    pub const fn is_critical(&self) -> bool {
        matches!(self, Self::Critical(_))
    }

    /// Returns if the error requires a derivation reset.
    pub const fn is_reset(&self) -> bool {
        matches!(self, Self::Reset(_))
    }
}

impl From<ResetError> for PipelineErrorKind {
    fn from(err: ResetError) -> Self {
        Self::Reset(err)
    }
}

impl core::error::Error for PipelineErrorKind {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Temporary(err) => Some(err),
            Self::Critical(err) => Some(err),
            Self::Reset(err) => Some(err),
        }
    }
}

/// An error encountered during derivation or sequencing.
#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A provider (L1 RPC, query service) failed to serve a request.
    #[display("Provider error: {_0}")]
    Provider(String),
    /// The execution engine failed to process a request.
    #[display("Engine error: {_0}")]
    Engine(String),
    /// The attributes builder failed to prepare payload attributes.
    #[display("Attributes builder error: {_0}")]
    AttributesBuilder(String),
    /// The external sequencer served a window that violates its own
    /// structural invariants, e.g. an in-window header stamped past the
    /// window end.
    #[display("Malformed sequencing window: {_0}")]
    MalformedWindow(String),
    /// The sequencer is not currently building a block.
    #[display("Not building a block")]
    NotBuilding,
}

impl core::error::Error for PipelineError {}

impl PipelineError {
    /// Wrap [PipelineError] as a [PipelineErrorKind::Critical].
    pub const fn crit(self) -> PipelineErrorKind {
        PipelineErrorKind::Critical(self)
    }

    /// Wrap [PipelineError] as a [PipelineErrorKind::Temporary].
    pub const fn temp(self) -> PipelineErrorKind {
        PipelineErrorKind::Temporary(self)
    }
}

/// A reset error.
#[derive(derive_more::Display, Debug, Clone, PartialEq, Eq)]
pub enum ResetError {
    /// The L1 origin of the next block is inconsistent with the L1 origin of
    /// the L2 head it would build on.
    #[display("L1 origin mismatch. Expected {_0}, got {_1}")]
    L1OriginMismatch(u64, u64),
    /// The engine requested a derivation reset.
    #[display("Engine reset: {_0}")]
    EngineReset(String),
}

impl core::error::Error for ResetError {}

impl ResetError {
    /// Wrap [ResetError] as a [PipelineErrorKind::Reset].
    pub const fn reset(self) -> PipelineErrorKind {
        PipelineErrorKind::Reset(self)
    }
}
