//! Prompt templates, each keyed by a small enum.

pub mod angles;
pub mod background;
pub mod handsfree;
pub mod reallife;
pub mod seo;
pub mod studio;
