//! Windows Service entry point for hostmon
//!
//! Registered by `hostmon --install`; the launch arguments written at install
//! time carry the Seq URL, interval and debug flag.

#[cfg(windows)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::ffi::OsString;
    use std::sync::OnceLock;
    use std::time::Duration;

    use clap::Parser;
    use tokio::sync::watch;
    use tracing::{error, info};
    use windows_service::{
        define_windows_service,
        service::{
            ServiceControl, ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus,
            ServiceType,
        },
        service_control_handler::{self, ServiceControlHandlerResult, ServiceStatusHandle},
        service_dispatcher,
    };

    use hostmon::cli::{init_logging, AgentArgs};
    use hostmon::core::config::MonitorConfig;
    use hostmon::monitor::run_agent;

    #[derive(Parser)]
    #[command(name = "hostmon-service")]
    struct ServiceCli {
        #[command(flatten)]
        agent: AgentArgs,
    }

    static CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

    define_windows_service!(ffi_service_main, service_main);

    fn service_main(_arguments: Vec<OsString>) {
        if let Err(e) = run_service() {
            error!("Service error: {}", e);
        }
    }

    fn set_state(
        handle: &ServiceStatusHandle,
        state: ServiceState,
        accepted: ServiceControlAccept,
        exit_code: u32,
        wait_hint: Duration,
    ) -> windows_service::Result<()> {
        handle.set_service_status(ServiceStatus {
            service_type: ServiceType::OWN_PROCESS,
            current_state: state,
            controls_accepted: accepted,
            exit_code: ServiceExitCode::Win32(exit_code),
            checkpoint: 0,
            wait_hint,
            process_id: None,
        })
    }

    fn run_service() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let config = CONFIG.get().ok_or("configuration not loaded")?;
        let (stop_tx, stop_rx) = watch::channel(false);

        let event_handler = move |control_event| -> ServiceControlHandlerResult {
            match control_event {
                ServiceControl::Stop | ServiceControl::Shutdown => {
                    let _ = stop_tx.send(true);
                    ServiceControlHandlerResult::NoError
                }
                ServiceControl::Interrogate => ServiceControlHandlerResult::NoError,
                _ => ServiceControlHandlerResult::NotImplemented,
            }
        };

        let status_handle = service_control_handler::register(&config.service_name, event_handler)?;

        set_state(
            &status_handle,
            ServiceState::StartPending,
            ServiceControlAccept::empty(),
            0,
            Duration::from_secs(10),
        )?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        set_state(
            &status_handle,
            ServiceState::Running,
            ServiceControlAccept::STOP | ServiceControlAccept::SHUTDOWN,
            0,
            Duration::default(),
        )?;
        info!("Service {} running", config.service_name);

        let result = runtime.block_on(run_agent(config, stop_rx));

        set_state(
            &status_handle,
            ServiceState::StopPending,
            ServiceControlAccept::empty(),
            0,
            Duration::from_secs(5),
        )?;
        drop(runtime);

        let exit_code = if result.is_ok() { 0 } else { 1 };
        set_state(
            &status_handle,
            ServiceState::Stopped,
            ServiceControlAccept::empty(),
            exit_code,
            Duration::default(),
        )?;
        info!("Service {} stopped", config.service_name);

        result.map_err(Into::into)
    }

    let cli = ServiceCli::parse();
    init_logging(cli.agent.debug)?;

    let config = MonitorConfig::resolve(cli.agent.config.as_deref(), &cli.agent.overrides())?;
    let service_name = config.service_name.clone();
    let _ = CONFIG.set(config);

    service_dispatcher::start(&service_name, ffi_service_main)?;
    Ok(())
}

#[cfg(not(windows))]
fn main() {
    eprintln!("hostmon-service only runs under the Windows service manager; use `hostmon` instead");
    std::process::exit(1);
}
