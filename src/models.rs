pub mod auth;
pub mod customer;
pub mod document;
pub mod drive;
pub mod notification;
pub mod task;
pub mod transaction;
