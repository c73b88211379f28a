use thiserror::Error;

/// Errors raised while rebuilding pattern objects from a markup tree.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PanelError {
    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("invalid value '{value}' for attribute '{attribute}' on <{element}>")]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
    },

    #[error("expected <{expected}>, found <{found}>")]
    UnexpectedElement { expected: String, found: String },

    #[error("<{element}> needs {expected} key points, found {found}")]
    KeyPointCount {
        element: String,
        expected: usize,
        found: usize,
    },

    #[error("markup json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PanelError>;
