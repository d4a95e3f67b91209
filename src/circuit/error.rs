#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("port '{0}' already exists")]
    AddDuplicatePort(String),

    #[error("instance '{0}' already exists")]
    AddDuplicateInstance(String),

    #[error("unmatched pin size '{0}' and net size '{1}'")]
    PinSizeUnmatch(usize, usize),

    #[error("supply pin '{0}' of instance '{1}' is tied to port '{2}' of another supply class")]
    SupplyMismatch(String, String, String),

    #[error("instance '{0}' has not been connected")]
    InstanceNotConnected(String),

    #[error("no pin {0} in instance {1}")]
    PinNotFound(String, String),

    #[error("no instance {0} in module {1}")]
    InstanceNotFound(String, String),

    #[error("no {0} leaf cell for {1} port(s) in pdk")]
    LeafcellNotFound(String, usize),

    #[error("{0}")]
    Message(String),
}

impl CircuitError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn msg<S: Into<String>>(msg: S) -> Self {
        Self::Message(msg.into())
    }
}

/// Returns early with a configuration error.
#[macro_export]
macro_rules! config_err {
    ($($arg:tt)*) => {
        return Err($crate::circuit::CircuitError::Configuration(format!($($arg)*)).into())
    };
}

/// Returns early with a configuration error unless `cond` holds.
#[macro_export]
macro_rules! check_arg {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::config_err!($($arg)*);
        }
    };
}
