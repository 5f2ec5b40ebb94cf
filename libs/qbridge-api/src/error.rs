use qbridge_kobj::KError;

/// Which side of a transport call went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plugin config or fixture content is unusable. Retrying will not help.
    Config,
    /// The network or filesystem failed.
    Io,
    /// A message could not be built or understood.
    Protocol,
    /// The call does not fit the session state, e.g. an unknown handle.
    Session,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Session => "session",
        }
    }
}

/// Error of a `Transport` method. Crosses the plugin boundary unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PluginError {
    kind: ErrorKind,
    message: String,
}

impl PluginError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        PluginError { kind, message: message.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Session, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefix the message with `ctx`; the kind is unchanged.
    pub fn with_context(mut self, ctx: impl std::fmt::Display) -> Self {
        self.message = format!("{ctx}: {}", self.message);
        self
    }
}

// ═══════════════════════════════════════════════════════════════
//  BridgeError
// ═══════════════════════════════════════════════════════════════

/// Everything `connect`, `evaluate` and `remote_call` can fail with.
///
/// None of these are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Function-like values, or a value the engine refuses to assemble.
    #[error("unsupported value kind: {0}")]
    UnsupportedValueKind(String),

    /// Type code outside the known set, or a child of the wrong shape.
    /// Points at an engine version mismatch.
    #[error("invalid type tag {code} in {context}")]
    InvalidTag { code: i8, context: &'static str },

    #[error("invalid attribute byte {0}")]
    InvalidAttribute(u8),

    /// The engine reported an error; the text is kept verbatim.
    #[error("remote error: {0}")]
    RemoteError(String),

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("transport ({kind}): {0}", kind = .0.kind().as_str())]
    Plugin(#[from] PluginError),

    #[error("config: {0}")]
    Config(String),
}

impl BridgeError {
    /// Engine message carried by a `RemoteError`.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            BridgeError::RemoteError(msg) => Some(msg),
            _ => None,
        }
    }
}

impl From<KError> for BridgeError {
    fn from(e: KError) -> Self {
        match e {
            KError::InvalidAttribute(raw) => BridgeError::InvalidAttribute(raw),
            other => BridgeError::UnsupportedValueKind(other.to_string()),
        }
    }
}
