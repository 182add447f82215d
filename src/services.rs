pub mod auth;
pub mod drive_service;
pub mod notification_service;
pub mod task_service;
pub mod transaction_service;
