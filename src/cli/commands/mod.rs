pub mod calc;
pub mod clean;
pub mod config;
pub mod generate;
pub mod init;
pub mod reports;
pub mod search;
pub mod status;
