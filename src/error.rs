use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("column '{0}' is not part of the data source")]
    UnknownColumn(String),
    #[error("column '{0}' is already used by another field")]
    ColumnInUse(String),
    #[error("{kind} elements require non-empty content")]
    MissingContent { kind: &'static str },
    #[error("no element at index {index} (configuration has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("loading form configuration failed")]
    Load(#[source] anyhow::Error),
    #[error("persisting form configuration failed")]
    Persist(#[source] anyhow::Error),
    #[error("reading the column catalog failed")]
    Catalog(#[source] anyhow::Error),
}
