// Configuration validation
use crate::error::Result;

/// Checks invariants serde cannot express (ranges, non-empty lists)
pub trait ConfigValidator {
    fn validate(&self) -> Result<()>;
}
