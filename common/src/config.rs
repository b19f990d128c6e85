//! Compiler configuration.
//!
//! Everything the compiler needs from its surroundings arrives here; the
//! core never reads the process environment.

/// Identifier-prefix parameters, interpolated as `{env}-{corp}-{service}`.
/// Opaque to the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    pub env: String,
    pub corp: String,
    pub service: String,
}

impl Naming {
    pub fn prefix(&self) -> String {
        format!("{}-{}-{}", self.env, self.corp, self.service)
    }

    /// Physical name for a logical identifier.
    pub fn resource_name(&self, id: &str) -> String {
        format!("{}-{id}", self.prefix())
    }
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            env: "test".to_string(),
            corp: "samcorp".to_string(),
            service: "tgwtest".to_string(),
        }
    }
}

pub const DEFAULT_KEY_PAIR: &str = "sample_keypair";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub naming: Naming,
    /// Key-pair reference handed to NAT instances, passed through untouched.
    pub key_pair: String,
    /// Treats unreachable-route warnings as fatal.
    pub deny_warnings: bool,
    /// Output verbosity: 0 full, 1 reduced, 2 plan only.
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: Naming::default(),
            key_pair: DEFAULT_KEY_PAIR.to_string(),
            deny_warnings: false,
            quiet: 0,
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
