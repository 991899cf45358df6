//! Service registration front-end
//!
//! Installing and removing the agent as an OS service is only implemented
//! for the Windows service control manager. Other platforms report
//! [`ServiceError::Unsupported`] so the CLI can exit with a clear message.

use std::fmt;
use std::time::Duration;

/// Display name shown in the service manager.
pub const SERVICE_DISPLAY_NAME: &str = "System Monitor Service";

/// Description registered with the service.
pub const SERVICE_DESCRIPTION: &str = "Collects host metrics and sends them to Seq";

/// File name of the service host binary, expected next to `hostmon`.
#[cfg(windows)]
pub const SERVICE_BINARY: &str = "hostmon-service.exe";
#[cfg(not(windows))]
pub const SERVICE_BINARY: &str = "hostmon-service";

/// Errors from service installation and removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Service management is not available on this platform
    Unsupported(&'static str),
    /// Required installation parameter missing
    MissingParameter(&'static str),
    /// The service manager could not be reached
    ManagerError(String),
    /// The named service does not exist
    NotFound(String),
    /// Creating, stopping or deleting the service failed
    OperationFailed(String),
    /// The service did not reach the stopped state in time
    StopTimeout(String),
    /// Generic IO error
    IoError(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => {
                write!(f, "{} is only available on Windows", what)
            }
            Self::MissingParameter(name) => {
                write!(f, "{} is required for service installation", name)
            }
            Self::ManagerError(msg) => write!(f, "Service manager error: {}", msg),
            Self::NotFound(name) => write!(f, "Service '{}' not found", name),
            Self::OperationFailed(msg) => write!(f, "Service operation failed: {}", msg),
            Self::StopTimeout(name) => write!(f, "Timed out stopping service '{}'", name),
            Self::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::IoError(err.to_string())
    }
}

/// Outcome of an install request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
}

/// Parameters baked into the installed service's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstallOptions {
    pub service_name: String,
    pub seq_url: String,
    pub interval: Duration,
    pub debug: bool,
}

impl ServiceInstallOptions {
    /// Arguments passed to the service host binary at start.
    pub fn launch_arguments(&self) -> Vec<String> {
        let mut args = vec![
            "--seq-url".to_string(),
            self.seq_url.clone(),
            "--interval".to_string(),
            crate::core::config::format_duration(self.interval),
            "--service-name".to_string(),
            self.service_name.clone(),
        ];
        if self.debug {
            args.push("--debug".to_string());
        }
        args
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.seq_url.trim().is_empty() {
            return Err(ServiceError::MissingParameter("Seq URL (--seq-url)"));
        }
        if self.service_name.trim().is_empty() {
            return Err(ServiceError::MissingParameter("Service name (--service-name)"));
        }
        Ok(())
    }
}

/// Register the service host with the OS service manager.
pub fn install_service(options: &ServiceInstallOptions) -> Result<InstallOutcome, ServiceError> {
    options.validate()?;

    #[cfg(windows)]
    {
        crate::windows::service::install(options)
    }

    #[cfg(not(windows))]
    {
        Err(ServiceError::Unsupported("Service installation"))
    }
}

/// Stop (if running) and remove the named service.
pub fn uninstall_service(service_name: &str) -> Result<(), ServiceError> {
    #[cfg(windows)]
    {
        crate::windows::service::uninstall(service_name)
    }

    #[cfg(not(windows))]
    {
        let _ = service_name;
        Err(ServiceError::Unsupported("Service removal"))
    }
}
