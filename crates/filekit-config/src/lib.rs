pub mod annotations;
pub mod config;
pub mod error;
pub mod source;

#[cfg(test)]
pub mod test_utils;
