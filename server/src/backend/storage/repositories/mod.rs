// Repository modules
pub mod activity_log_repository;
pub mod avatar_repository;
pub mod contribution_repository;
pub mod loan_repository;
pub mod member_repository;
pub mod settings_repository;

// Re-export repository types
pub use activity_log_repository::ActivityLogRepository;
pub use avatar_repository::AvatarRepository;
pub use contribution_repository::ContributionRepository;
pub use loan_repository::LoanRepository;
pub use member_repository::MemberRepository;
pub use settings_repository::SettingsRepository;
