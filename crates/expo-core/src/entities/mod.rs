//! Entity structs for all Expo collections.
//!
//! Each entity is stored as one JSON document per row in its collection table.
//! Embedded copies of other entities are the summary structs re-exported here;
//! they are built only by [`crate::summaries`].

mod class;
mod company;
mod exhibition;
mod knowledge;
mod project;
mod review;
mod role;
mod user;

pub use class::SchoolClass;
pub use company::Company;
pub use exhibition::{CriteriaResume, Exhibition, ExhibitionSummary, ProjectResume, RoleResume};
pub use knowledge::Knowledge;
pub use project::{ExpositorResume, Project};
pub use review::{
    Grade, Review, ReviewExhibition, ReviewProject, ReviewResume, ReviewerResume, ReviewerRole,
};
pub use role::{Role, RoleSummary};
pub use user::{User, UserProjectResume, UserReviewResume};
