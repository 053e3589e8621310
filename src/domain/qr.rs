//! QR error-correction strength.

use serde::{Deserialize, Serialize};

/// Recovery level trading code density for damage tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecoveryLevel {
    /// ~7% of codewords can be restored
    Low,
    /// ~15%
    #[default]
    Medium,
    /// ~25%
    High,
    /// ~30%
    Highest,
}

impl RecoveryLevel {
    /// Parse a level name; unknown names fall back to `Medium`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Self::Low,
            "high" | "q" => Self::High,
            "highest" | "h" => Self::Highest,
            _ => Self::Medium,
        }
    }
}
