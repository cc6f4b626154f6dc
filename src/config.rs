//! Server CLI and environment contract (spec.md §6).

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "swerex-runtime", about = "Sandboxed shell-execution runtime for agents")]
pub struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value_t = 8880)]
    pub port: u16,

    /// Shared token required in the `X-API-Key` header. Empty disables auth.
    /// Falls back to `SWE_REX_API_KEY` when not passed on the command line.
    #[arg(long, env = "SWE_REX_API_KEY", default_value = "")]
    pub api_key: String,
}
