/// Reasons [crate::BinauralEngine::prepare] refuses to start processing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PrepareError {
    #[error("Block size {0} is not a power of two")]
    InvalidBlockSize(usize),

    #[error("Sample rate {0} must be finite and positive")]
    InvalidSampleRate(f64),

    #[error("Vocoder transform size {0} is not a power of two")]
    InvalidTransformSize(usize),

    #[error("Delay lines must hold a finite, positive duration, not {0} seconds")]
    InvalidDelayLineLength(f64),
}

/// Reasons loading the HRIR dataset failed as a whole.
///
/// Individual resources that fail to decode are not errors: their slots are left empty.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    #[error("The resource provider has no resources")]
    NoResources,

    #[error("None of the {0} resources could be decoded")]
    NothingDecoded(usize),
}

#[derive(Debug, derive_more::Display, derive_more::IsVariant)]
enum ErrorPayload {
    #[display(fmt = "Configuration error: {}", _0)]
    Prepare(PrepareError),

    #[display(fmt = "HRIR dataset error: {}", _0)]
    Dataset(DatasetError),
}

#[derive(Debug, thiserror::Error)]
#[error("{payload}")]
pub struct Error {
    payload: ErrorPayload,
}

macro_rules! conv {
    ($variant: ident, $from_err: path) => {
        impl From<$from_err> for Error {
            fn from(value: $from_err) -> Error {
                Error {
                    payload: ErrorPayload::$variant(value),
                }
            }
        }
    };
}

conv!(Prepare, PrepareError);
conv!(Dataset, DatasetError);

impl Error {
    /// Does this error come from a bad configuration passed to `prepare`?
    pub fn is_configuration(&self) -> bool {
        self.payload.is_prepare()
    }

    /// Does this error come from loading the HRIR dataset?
    pub fn is_dataset(&self) -> bool {
        self.payload.is_dataset()
    }

    pub fn as_prepare_error(&self) -> Option<&PrepareError> {
        match &self.payload {
            ErrorPayload::Prepare(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_dataset_error(&self) -> Option<&DatasetError> {
        match &self.payload {
            ErrorPayload::Dataset(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
