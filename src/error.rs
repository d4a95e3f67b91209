use crate::{circuit::CircuitError, layout::LayoutError, pdk::PdkError};

#[derive(Debug, thiserror::Error)]
pub enum LpRamError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Pdk(#[from] PdkError),

    #[error("{0}")]
    Message(String),

    #[error("{msg} >> {err}")]
    Context { msg: String, err: Box<dyn std::error::Error + Send + Sync> }
}

pub type LpRamResult<T> = Result<T, LpRamError>;

impl LpRamError {
    /// Looks through context layers for the circuit error that caused this one.
    pub fn circuit_error(&self) -> Option<&CircuitError> {
        match self {
            Self::Circuit(e) => Some(e),
            Self::Context { err, .. } => {
                if let Some(e) = err.downcast_ref::<LpRamError>() {
                    e.circuit_error()
                } else {
                    err.downcast_ref::<CircuitError>()
                }
            }
            _ => None,
        }
    }

    /// Looks through context layers for the layout error that caused this one.
    pub fn layout_error(&self) -> Option<&LayoutError> {
        match self {
            Self::Layout(e) => Some(e),
            Self::Context { err, .. } => {
                if let Some(e) = err.downcast_ref::<LpRamError>() {
                    e.layout_error()
                } else {
                    err.downcast_ref::<LayoutError>()
                }
            }
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self.circuit_error(), Some(CircuitError::Configuration(_)))
    }

    pub fn is_verification(&self) -> bool {
        matches!(self.layout_error(), Some(LayoutError::Verification { .. }))
    }
}

pub trait ErrorContext<T> {
    fn context<S: Into<String>>(self, msg: S) -> LpRamResult<T>;
    fn with_context<S: Into<String>>(self, f: impl Fn() -> S) -> LpRamResult<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ErrorContext<T> for Result<T, E> {
    fn context<S: Into<String>>(self, msg: S) -> LpRamResult<T> {
        self.map_err(|e| LpRamError::Context { msg: msg.into(), err: Box::new(e) })
    }

    fn with_context<S: Into<String>>(self, f: impl Fn() -> S) -> LpRamResult<T> {
        self.map_err(|e| LpRamError::Context { msg: f().into(), err: Box::new(e) })
    }
}
