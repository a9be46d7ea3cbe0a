use std::time::Duration;

/// Tunables for the Inspector Supervisor (SPEC_FULL.md §4.5), defaulted to
/// the documented values.
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub inspector_binary: std::path::PathBuf,
    pub config_plugin_name: String,
    pub logger_plugin_name: String,
    pub startup_deadline: Duration,
    pub health_check_interval: Duration,
    pub health_failure_threshold: u32,
    pub shutdown_grace_period: Duration,
    pub restart_backoff_base: Duration,
    pub restart_backoff_ceiling: Duration,
    pub max_restarts: u32,
}

impl SupervisorConfig {
    pub fn new(inspector_binary: impl Into<std::path::PathBuf>) -> Self {
        SupervisorConfig {
            inspector_binary: inspector_binary.into(),
            config_plugin_name: "submerge_config".to_string(),
            logger_plugin_name: "submerge_logger".to_string(),
            startup_deadline: Duration::from_secs(10),
            health_check_interval: Duration::from_secs(60),
            health_failure_threshold: 3,
            shutdown_grace_period: Duration::from_secs(5),
            restart_backoff_base: Duration::from_secs(1),
            restart_backoff_ceiling: Duration::from_secs(60),
            max_restarts: 5,
        }
    }
}
