//! Core domain logic

pub mod due_date;

pub use due_date::compute_due_date;
