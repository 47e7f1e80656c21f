pub mod by_comment;
pub mod component;
#[cfg(feature = "email")]
pub mod email;
pub mod hours;
pub mod page;
pub mod request;
pub mod roadmap;
pub mod ticket_change;
pub mod user_hours;
