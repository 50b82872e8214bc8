//! Database access shared by feedloop services

pub mod init;

pub use init::init_database;
