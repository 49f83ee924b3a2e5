pub mod assembly;
pub mod redefinition;

pub use assembly::assemble;
pub use redefinition::{Redefinition, apply_redefinition, apply_redefinitions, parse_redefinitions};

use crate::models::ConfigId;

/// Ordered task configurations, by identity.
pub type Pipeline = Vec<ConfigId>;
