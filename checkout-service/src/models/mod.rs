pub mod plan;
pub mod requests;

pub use plan::{BillingCycle, Plan, PlanError};
pub use requests::{CheckoutRequest, CheckoutResponse};
