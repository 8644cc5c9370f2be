pub mod lemonsqueezy;
pub mod metrics;

pub use lemonsqueezy::{EventKind, LemonSqueezyClient, WebhookEvent};
pub use metrics::{get_metrics, init_metrics};
