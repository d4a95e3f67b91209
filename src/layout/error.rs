#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("cell '{cell}' failed verification with {} violation(s): {}", violations.len(), violations.join("; "))]
    Verification { cell: String, violations: Vec<String> },

    #[error("no layout pin '{0}' in cell '{1}'")]
    PinNotFound(String, String),

    #[error("instance '{0}' has no placement")]
    InstanceNotPlaced(String),

    #[error("cell '{0}' has no layout")]
    MissingLayout(String),
}
