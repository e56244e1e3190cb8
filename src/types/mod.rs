//! Domain types exchanged with the backend.

pub mod claim;
pub mod policy;
pub mod user;

pub use claim::{Claim, ClaimApproval, ClaimStatus, ClaimSubmission};
pub use policy::{
    parse_annual_salary, Policy, PolicyApplication, RiskLevel, UserPolicy, UserPolicyStatus,
};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, User, UserProfile, UserRole};
