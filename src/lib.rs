//! # tickethours - hours tracking for ticket trackers
//!
//! Records time worked against tickets and keeps each ticket's
//! `totalhours` field equal to the sum of its time entries. Hours can be
//! logged from a form, edited, or written into ticket comments as
//! "2 hours" / "1:30 hours".
//!
//! Reports select tickets with a query language (`status!=closed&owner=joe`),
//! filter entries by worker and date range, group them by a ticket field,
//! ticket, worker or date, and render as terminal tables, HTML, RSS or CSV.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tickethours::libs::env::Env;
//! use tickethours::web::component::ComponentManager;
//! use tickethours::web::request::Request;
//! use tickethours::libs::permission::Permissions;
//!
//! # fn main() -> tickethours::libs::error::Result<()> {
//! let mut env = Env::new()?;
//! let req = Request::get("/hours").user(Some("joe"), Permissions::all());
//! let response = ComponentManager::new().dispatch(&mut env, &req)?;
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod db;
pub mod libs;
pub mod web;
