//! Application services - Business logic orchestration

pub mod guestbook_service;

pub use guestbook_service::GuestbookService;
