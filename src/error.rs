// Gestion des erreurs personnalisées

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum RoutingError {
    Config(String),
    Bind(std::io::Error),
    Decode(String),
    InvalidGraph(String),
    Probe(String),
    KernelRoute(String),
    TransientIo(std::io::Error),
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::Config(msg) => write!(f, "configuration error: {}", msg),
            RoutingError::Bind(err) => write!(f, "bind error: {}", err),
            RoutingError::Decode(msg) => write!(f, "LSA decode error: {}", msg),
            RoutingError::InvalidGraph(msg) => write!(f, "invalid graph: {}", msg),
            RoutingError::Probe(msg) => write!(f, "probe failure: {}", msg),
            RoutingError::KernelRoute(msg) => write!(f, "kernel route error: {}", msg),
            RoutingError::TransientIo(err) => write!(f, "transient I/O error: {}", err),
        }
    }
}

impl StdError for RoutingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            RoutingError::Bind(err) => Some(err),
            RoutingError::TransientIo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(err: serde_json::Error) -> Self {
        RoutingError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
