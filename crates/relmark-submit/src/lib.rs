//! relmark submit - publish a reviewed commit as an immutable submission tag
//!
//! The planner derives `submit/<branch>/<timestamp>` names, the protocol
//! creates and pushes the tag and deletes it again if the push fails.

pub mod message;
pub mod planner;
pub mod protocol;
pub mod workflow;

pub use message::{compose_message, strip_comments};
pub use planner::{TagPlan, TagPlanner, TIMESTAMP_FORMAT};
pub use protocol::{PublicationState, ReleaseTag, TagPublication};
pub use workflow::{PreparedSubmission, SubmitOptions, SubmitReport, SubmitWorkflow};
