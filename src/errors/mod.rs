use std::fmt;

/// The shared return-code space used end-to-end by the storage manager,
/// buffer pool and record manager.
#[derive(Debug)]
pub enum Error {
    FileNotFound(String),
    FileHandleNotInit,
    FileCloseFailed(String),
    WriteFailed(String),
    ReadNonExistingPage(i64),
    PinnedPagesInBuffer,
    InvalidParameter(String),
    #[allow(dead_code)]
    MemoryAllocationError,
    Generic(String),
    NoMoreTuples,
    NoTupleWithGivenRid,
    ScanConditionNotFound,
    CompareValueOfDifferentDatatype,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FileNotFound(name) => write!(f, "file not found: {name}"),
            Error::FileHandleNotInit => write!(f, "file handle not initialized"),
            Error::FileCloseFailed(name) => write!(f, "failed to close file: {name}"),
            Error::WriteFailed(context) => write!(f, "write failed: {context}"),
            Error::ReadNonExistingPage(n) => write!(f, "attempted to read non-existing page {n}"),
            Error::PinnedPagesInBuffer => write!(f, "buffer pool has pinned pages"),
            Error::InvalidParameter(context) => write!(f, "invalid parameter: {context}"),
            Error::MemoryAllocationError => write!(f, "memory allocation error"),
            Error::Generic(context) => write!(f, "error: {context}"),
            Error::NoMoreTuples => write!(f, "no more tuples"),
            Error::NoTupleWithGivenRid => write!(f, "no tuple with given rid"),
            Error::ScanConditionNotFound => write!(f, "scan condition not found"),
            Error::CompareValueOfDifferentDatatype => {
                write!(f, "attempted to compare values of different datatypes")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
