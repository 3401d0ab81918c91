//! Core domain types
//!
//! These types are shared between the server (which persists them) and the
//! poller (which drives courses through the layout workflow).

pub mod course;
pub mod layout;
pub mod transition;

pub use course::{Course, CourseOwner, CourseStatus, ProcessingCourse};
pub use layout::{Chapter, CourseLayout, LayoutError, Topic, parse_layout};
pub use transition::{Transition, TransitionError};
