pub mod aggregate;
pub mod catalog;
pub mod comments;
pub mod error;
pub mod query;
pub mod repos;
