use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use gpu_agent_core::{AgentConfig, BackendOverride};

pub const DEFAULT_PORT: u16 = 11435;

#[derive(Debug, Parser)]
#[command(name = "gpu-agent")]
#[command(about = "Sidecar exposing GPU memory, temperature and utilization over HTTP", long_about = None)]
pub struct Args {
    /// GPU backend (auto, nvidia, amd)
    #[arg(long, env = "GPU_BACKEND", default_value = "auto")]
    pub backend: BackendOverride,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "GPU_AGENT_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Seconds before a vendor tool invocation is abandoned
    #[arg(long, env = "GPU_AGENT_QUERY_TIMEOUT_SECS", default_value_t = 10)]
    pub query_timeout_secs: u64,

    /// Directories searched for nvidia-smi and rocm-smi instead of PATH
    #[arg(long, env = "GPU_AGENT_SEARCH_PATH")]
    pub search_path: Option<OsString>,
}

impl Args {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            backend: self.backend,
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            search_path: self.search_path.clone(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
