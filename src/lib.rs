//! Scheduling and calendar engine for field-service planning.
//!
//! Planning items are created through a [`planner::Planner`], either one at a
//! time from a calendar slot or as a recurring plan expanded over a date
//! range. The week and month views render read-only [`model::CalendarEvent`]
//! projections and report clicks and drag selections back through
//! [`view::CalendarHandler`].

pub mod ast;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod planner;
pub mod processing;
pub mod recurrence;
pub mod selection;
pub mod settings;
pub mod store;
pub mod time;
pub mod view;

pub use error::{PlannerError, Result, StoreError, ValidationError};
pub use model::{CalendarEvent, PlanningItem, PlanningStatus, Project, Resource};
pub use planner::Planner;
pub use settings::Settings;
