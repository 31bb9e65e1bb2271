pub mod donor;
pub mod guideline;
pub mod notification;
pub mod partner;
pub mod screening;
pub mod transcript;
