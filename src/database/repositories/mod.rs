//! Repository implementations

pub mod checklist;
pub mod event;
pub mod user;

pub use checklist::ChecklistRepository;
pub use event::EventRepository;
pub use user::UserRepository;
