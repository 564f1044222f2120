use thiserror::Error;

/// Errors raised while predicting or clustering regions of genomic plasticity.
#[derive(Error, Debug)]
pub enum RgpError {
    /// Annotation, partition or region data needed by a step is absent.
    #[error("Missing prerequisite: {0}")]
    PrerequisiteMissing(String),

    #[error(
        "You are trying to predict RGPs in a pangenome that already have them predicted. \
         If you REALLY want to do that, use --force \
         (it will erase RGPs and every feature computed from them)."
    )]
    AlreadyComputed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A region without genes was queried for its contig border status or indexed.
    #[error("Region '{0}' contains no genes")]
    EmptyRegion(String),

    #[error("Worker failed while evaluating chunk {chunk}: {message}")]
    WorkerFailure { chunk: usize, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table error: {0}")]
    Csv(#[from] csv::Error),
}

impl RgpError {
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        RgpError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RgpError>;
