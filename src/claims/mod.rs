pub mod model;
pub mod store;

pub use model::{Claim, EncodedClaim};
pub use store::{validate_claim_id, ClaimStore};
