#[derive(Debug, thiserror::Error)]
pub enum PdkError {
    #[error("pdk '{0}' defines no cell family")]
    NoCellFamily(String),

    #[error("cell family for {0} port(s) is defined twice")]
    DuplicateFamily(usize),

    #[error("cell family for {0} port(s) lacks a {1} cell")]
    MissingLeafCell(usize, String),

    #[error("cell '{0}' lacks a pin for {1}")]
    MissingPinRole(String, String),

    #[error("cell '{0}' has an unexpected pin '{1}'")]
    UnexpectedPin(String, String),

    #[error("cell '{0}' declares pin '{1}' twice")]
    DuplicatePin(String, String),

    #[error("pin '{1}' of cell '{0}' has direction {2:?} which does not suit its role")]
    PinDirection(String, String, crate::circuit::PortDirection),

    #[error("cell '{0}' has a non-positive size {1}x{2}")]
    InvalidSize(String, i64, i64),

    #[error("invalid pin rect {1:?} on pin '{0}'")]
    InvalidRect(String, [i64; 4]),
}
