use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("shape mismatch in {op}: expected {expected:?}, got {actual:?}")]
    Shape {
        op: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("reshape failed: {0}")]
    Reshape(#[from] ndarray::ShapeError),

    #[error("checkpoint encoding failed: {0}")]
    Checkpoint(#[from] postcard::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape(op: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::Shape {
            op,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

pub(crate) fn ensure_shape(op: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected != actual {
        return Err(Error::shape(op, expected, actual));
    }
    Ok(())
}
