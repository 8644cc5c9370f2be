//! Subscription plans and their LemonSqueezy variants.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Invalid plan: {plan} {billing}")]
    Unknown { plan: String, billing: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Pro,
    Business,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Starter, Plan::Pro, Plan::Business];

    /// Generation credits granted by the plan.
    pub fn credits(&self) -> u32 {
        match self {
            Plan::Starter => 100,
            Plan::Pro => 400,
            Plan::Business => 1200,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Pro => "pro",
            Plan::Business => "business",
        }
    }
}

impl BillingCycle {
    pub const ALL: [BillingCycle; 2] = [BillingCycle::Monthly, BillingCycle::Yearly];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl FromStr for Plan {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(Plan::Starter),
            "pro" => Ok(Plan::Pro),
            "business" => Ok(Plan::Business),
            _ => Err(()),
        }
    }
}

impl FromStr for BillingCycle {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LemonSqueezy product variant sold for a plan and billing cycle.
pub fn variant_for(plan: Plan, billing: BillingCycle) -> u64 {
    match (plan, billing) {
        (Plan::Starter, BillingCycle::Monthly) => 1210536,
        (Plan::Starter, BillingCycle::Yearly) => 1210594,
        (Plan::Pro, BillingCycle::Monthly) => 1210603,
        (Plan::Pro, BillingCycle::Yearly) => 1210606,
        (Plan::Business, BillingCycle::Monthly) => 1210608,
        (Plan::Business, BillingCycle::Yearly) => 1210610,
    }
}

pub fn plan_for_variant(variant_id: u64) -> Option<(Plan, BillingCycle)> {
    Plan::ALL
        .into_iter()
        .flat_map(|plan| BillingCycle::ALL.into_iter().map(move |billing| (plan, billing)))
        .find(|(plan, billing)| variant_for(*plan, *billing) == variant_id)
}

/// Resolve the raw `planId`/`billing` strings from a checkout request.
pub fn resolve_variant(plan: &str, billing: &str) -> Result<(Plan, BillingCycle, u64), PlanError> {
    let unknown = || PlanError::Unknown {
        plan: plan.to_string(),
        billing: billing.to_string(),
    };
    let plan_kind: Plan = plan.parse().map_err(|_| unknown())?;
    let cycle: BillingCycle = billing.parse().map_err(|_| unknown())?;
    Ok((plan_kind, cycle, variant_for(plan_kind, cycle)))
}
