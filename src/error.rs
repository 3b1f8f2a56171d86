//! Unified error types for the RadThing firmware.
//!
//! Every port and adapter reports failures through one of the small
//! `Copy` enums below; they all convert into the top-level [`Error`].
//! Connectivity faults are logged and retried by the supervisor, so in
//! practice only configuration errors ever reach `main`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A network, broker or publish operation failed.
    Comms(CommsError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// The sensing collaborator could not be initialised.
    Sensing(SensingError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Sensing(e) => write!(f, "sensing: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The WiFi station did not associate within the attempt window.
    NetworkTimeout,
    /// The network credentials were rejected before an attempt was made.
    InvalidCredentials,
    /// The network link is down.
    NetworkDown,
    /// The broker refused or never acknowledged the connection.
    BrokerConnectFailed,
    /// The broker link is down.
    BrokerDown,
    /// A publish was not handed to the broker.
    PublishFailed,
    /// A subscription request was not accepted.
    SubscribeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkTimeout => write!(f, "network attempt timed out"),
            Self::InvalidCredentials => write!(f, "network credentials invalid"),
            Self::NetworkDown => write!(f, "network down"),
            Self::BrokerConnectFailed => write!(f, "broker connect failed"),
            Self::BrokerDown => write!(f, "broker down"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for [`NodeConfig`](crate::config::NodeConfig).
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` names the field and the rule.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed config document"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Sensing errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensingError {
    /// GPIO interrupt registration failed.
    InterruptSetupFailed,
}

impl fmt::Display for SensingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InterruptSetupFailed => write!(f, "interrupt setup failed"),
        }
    }
}

impl From<SensingError> for Error {
    fn from(e: SensingError) -> Self {
        Self::Sensing(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
