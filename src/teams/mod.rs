mod repository;
mod types;

pub use repository::{MembershipReader, MembershipWriter};
pub use types::{NewMember, TeamMembership, TeamPermission};

#[cfg(any(test, feature = "mocks"))]
mod mocks;

#[cfg(any(test, feature = "mocks"))]
pub use mocks::MockMembershipStore;
