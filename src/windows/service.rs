//! Windows service control manager registration

use std::ffi::OsString;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;
use windows_service::service::{
    ServiceAccess, ServiceErrorControl, ServiceInfo, ServiceStartType, ServiceState, ServiceType,
};
use windows_service::service_manager::{ServiceManager, ServiceManagerAccess};

use crate::platform::service::{
    InstallOutcome, ServiceError, ServiceInstallOptions, SERVICE_BINARY, SERVICE_DESCRIPTION,
    SERVICE_DISPLAY_NAME,
};

const STOP_TIMEOUT: Duration = Duration::from_secs(30);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(300);

fn manager(access: ServiceManagerAccess) -> Result<ServiceManager, ServiceError> {
    ServiceManager::local_computer(None::<&str>, access)
        .map_err(|e| ServiceError::ManagerError(e.to_string()))
}

/// Register `hostmon-service.exe` with automatic start.
pub fn install(options: &ServiceInstallOptions) -> Result<InstallOutcome, ServiceError> {
    let exe = std::env::current_exe()?;
    let service_exe = exe.with_file_name(SERVICE_BINARY);

    let manager = manager(ServiceManagerAccess::CONNECT | ServiceManagerAccess::CREATE_SERVICE)?;

    if manager
        .open_service(&options.service_name, ServiceAccess::QUERY_STATUS)
        .is_ok()
    {
        info!("Service '{}' is already installed", options.service_name);
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    let service_info = ServiceInfo {
        name: OsString::from(&options.service_name),
        display_name: OsString::from(SERVICE_DISPLAY_NAME),
        service_type: ServiceType::OWN_PROCESS,
        start_type: ServiceStartType::AutoStart,
        error_control: ServiceErrorControl::Normal,
        executable_path: service_exe,
        launch_arguments: options
            .launch_arguments()
            .into_iter()
            .map(OsString::from)
            .collect(),
        dependencies: vec![],
        account_name: None,
        account_password: None,
    };

    let service = manager
        .create_service(&service_info, ServiceAccess::CHANGE_CONFIG)
        .map_err(|e| ServiceError::OperationFailed(format!("create service: {}", e)))?;
    service
        .set_description(SERVICE_DESCRIPTION)
        .map_err(|e| ServiceError::OperationFailed(format!("set description: {}", e)))?;

    info!(
        "Service '{}' installed (Seq: {}, interval: {:?}, debug: {})",
        options.service_name, options.seq_url, options.interval, options.debug
    );
    Ok(InstallOutcome::Installed)
}

/// Stop the service if needed, wait for it to stop, then delete it.
pub fn uninstall(service_name: &str) -> Result<(), ServiceError> {
    let manager = manager(ServiceManagerAccess::CONNECT)?;

    let access = ServiceAccess::QUERY_STATUS | ServiceAccess::STOP | ServiceAccess::DELETE;
    let service = manager
        .open_service(service_name, access)
        .map_err(|_| ServiceError::NotFound(service_name.to_string()))?;

    let query = |s: &windows_service::service::Service| {
        s.query_status()
            .map(|status| status.current_state)
            .map_err(|e| ServiceError::OperationFailed(format!("query status: {}", e)))
    };

    if query(&service)? != ServiceState::Stopped {
        info!("Stopping service '{}'...", service_name);
        service
            .stop()
            .map_err(|e| ServiceError::OperationFailed(format!("stop: {}", e)))?;

        let deadline = Instant::now() + STOP_TIMEOUT;
        while query(&service)? != ServiceState::Stopped {
            if Instant::now() >= deadline {
                return Err(ServiceError::StopTimeout(service_name.to_string()));
            }
            thread::sleep(STOP_POLL_INTERVAL);
        }
    }

    service
        .delete()
        .map_err(|e| ServiceError::OperationFailed(format!("delete: {}", e)))?;

    info!("Service '{}' uninstalled", service_name);
    Ok(())
}
