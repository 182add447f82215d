pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod document_repo;
pub use document_repo::DocumentRepository;
pub mod drive_repo;
pub use drive_repo::DriveRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod task_repo;
pub use task_repo::TaskRepository;
pub mod transaction_repo;
pub use transaction_repo::{TransactionFilter, TransactionRepository};
pub mod user_repo;
pub use user_repo::UserRepository;
