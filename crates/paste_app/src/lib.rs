//! just_paste terminal front end.
pub mod platform;
