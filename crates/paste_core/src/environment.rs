use once_cell::sync::Lazy;
use regex::Regex;

/// Capability query for the environment the client runs in.
///
/// Mobile environments have no usable destination directory, so the path
/// input is hidden and the server picks a temporary location.
pub trait Environment {
    fn is_mobile_environment(&self) -> bool;
}

static MOBILE_USER_AGENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
        .expect("mobile pattern")
});

/// Detects mobile devices by matching a user agent against known device keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentEnvironment {
    user_agent: String,
}

impl UserAgentEnvironment {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl Environment for UserAgentEnvironment {
    fn is_mobile_environment(&self) -> bool {
        MOBILE_USER_AGENT_RE.is_match(&self.user_agent)
    }
}

/// Detects mobile targets from the platform the binary was compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetEnvironment;

impl Environment for TargetEnvironment {
    fn is_mobile_environment(&self) -> bool {
        matches!(std::env::consts::OS, "android" | "ios")
    }
}
