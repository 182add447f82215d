pub mod auth;
pub mod customers;
pub mod documents;
pub mod drive;
pub mod notifications;
pub mod portal;
pub mod tasks;
pub mod transactions;
