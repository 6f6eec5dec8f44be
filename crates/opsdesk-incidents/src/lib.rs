//! In-memory incident desk: the ordered incident collection, its
//! filter/sort projection, tag editing rules and the notification feed.

pub mod desk;
pub mod filter;
pub mod notifications;
pub mod seed;
pub mod tags;

pub use desk::{DeskError, IncidentDesk};
pub use filter::{AssigneeFilter, IncidentFilter, SortOrder};
pub use tags::{TagError, TagSet};
