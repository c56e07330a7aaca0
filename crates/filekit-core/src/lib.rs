use error::FileError;

pub mod args;
pub mod detect;
pub mod error;
pub mod options;
pub mod parse;
pub mod provision;

pub type FileResult<T> = std::result::Result<T, FileError>;
