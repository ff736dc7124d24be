//! CLI command implementations

pub mod export;
pub mod history;
pub mod init;
pub mod schedule;
pub mod test_connection;
pub mod validate;
