pub mod metrics;
pub mod providers;
pub mod studio;

pub use metrics::{get_metrics, init_metrics};
pub use studio::StudioEngine;
