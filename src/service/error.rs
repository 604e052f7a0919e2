use std::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The controller task is not running.
    Unbound,
    /// A command or reply could not be delivered.
    Delivery(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Unbound => write!(f, "Playback service is not bound"),
            ServiceError::Delivery(s) => write!(f, "Delivery failed: {}", s),
        }
    }
}

impl Error for ServiceError {}
