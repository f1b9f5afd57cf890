use std::path::PathBuf;

/// Errors raised by the board and the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("illegal move: {side} hole {hole}")]
    IllegalMove { side: crate::game::Side, hole: usize },
}

/// Errors raised while decoding a wire message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Errors raised by an agent session talking to a game engine.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("connection to game engine failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that end (or prevent) a match driven by the turn arbiter.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    #[error("peer sent an invalid message: {0}")]
    InvalidMessage(String),

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("peer process failure: {0}")]
    ProcessFailure(#[from] std::io::Error),

    #[error("no match in progress (call reset first)")]
    NoMatch,

    #[error("match is already finished")]
    MatchOver,
}

impl From<ProtocolError> for ArbiterError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidMessage(msg) => ArbiterError::InvalidMessage(msg),
        }
    }
}

impl From<GameError> for ArbiterError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::InvalidArgument(msg) => ArbiterError::InvalidMessage(msg),
            GameError::IllegalMove { side, hole } => {
                ArbiterError::IllegalMove(format!("{side} hole {hole}"))
            }
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
