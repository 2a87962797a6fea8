//! Application use cases. Orchestrate domain logic via ports.

pub mod entitlement_service;
pub mod planner_service;
pub mod prompts;

pub use entitlement_service::EntitlementService;
pub use planner_service::PlannerService;
