pub mod booking_repository;
pub mod inventory_repository;
pub mod member_repository;
pub mod user_repository;

pub use booking_repository::BookingRepository;
pub use inventory_repository::InventoryRepository;
pub use member_repository::MemberRepository;
pub use user_repository::UserRepository;
