use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error while exporting: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error while exporting: {0}")]
    Csv(#[from] csv::Error),
}
