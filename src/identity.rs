//! Identity resolution for freight commands.
//!
//! Consignors post and cancel loads; carriers quote and book them. Either way
//! a command needs to know who is acting. Rather than requiring `--as` on
//! every invocation, identity is resolved through a chain:
//!
//! 1. `--as <uuid>`: explicit per-command override
//! 2. `FREIGHT_IDENTITY` env var: session level
//! 3. `identity` in `~/.freight/config.toml`: global default

use std::env;

use uuid::Uuid;

use crate::config::Config;

/// Error message shown when identity cannot be resolved.
pub const IDENTITY_REQUIRED: &str = "identity required: pass --as <uuid>, \
    set FREIGHT_IDENTITY, or add `identity = \"...\"` to ~/.freight/config.toml";

/// Resolve the acting party from the tiered resolution chain.
///
/// Checks in order: explicit `--as` value, `FREIGHT_IDENTITY` env var,
/// the config file. Returns an error with [`IDENTITY_REQUIRED`] when none of
/// the sources yield a value, or when the value found is not a UUID.
pub fn resolve_identity(explicit: Option<&str>, config: &Config) -> Result<Uuid, String> {
    let env_identity = env::var("FREIGHT_IDENTITY").ok();
    resolve_from(explicit, env_identity.as_deref(), config.identity.as_deref())
}

fn resolve_from(
    explicit: Option<&str>,
    env_identity: Option<&str>,
    configured: Option<&str>,
) -> Result<Uuid, String> {
    let (source, raw) = [
        ("--as", explicit),
        ("FREIGHT_IDENTITY", env_identity),
        ("config identity", configured),
    ]
    .into_iter()
    .find_map(|(source, value)| value.filter(|v| !v.is_empty()).map(|v| (source, v)))
    .ok_or_else(|| IDENTITY_REQUIRED.to_string())?;

    raw.parse::<Uuid>()
        .map_err(|e| format!("{source} value '{raw}' is not a valid UUID: {e}"))
}
