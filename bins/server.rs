use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

use configs::AppConfig;

fn main() -> std::process::ExitCode {
    // load .env first so RUST_LOG and config overrides apply
    dotenv().ok();
    // config file is optional, a broken one is fatal
    let cfg = match AppConfig::load_or_default() {
        Ok(cfg) => cfg,
        Err(e) => {
            // no usable config, so log in the default format
            common::utils::logging::init_logging_default();
            error!(service = "barrels", event = "config_invalid", error = %e, "invalid configuration");
            return std::process::ExitCode::FAILURE;
        }
    };
    common::utils::logging::init_logging(&cfg.logging.format);
    info!(service = "barrels", event = "logger_init", "tracing subscriber initialized");

    // basic service context, nothing sensitive
    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // panic hook: log unhandled panics with the service context
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "barrels",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    // tokio runtime, thread count from config
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = cfg.server.worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "barrels", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    // service start event
    info!(
        service = "barrels",
        event = "start",
        %service_id,
        pid,
        version,
        threads = cfg.server.worker_threads.unwrap_or_default(),
        data_file = %cfg.data_file().display(),
        "barrel service starting"
    );

    // run until Ctrl+C; the server saves the registry on the way out
    match rt.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(service = "barrels", event = "stop", %service_id, pid, "barrel service stopped");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "barrels", event = "run_failed", error = %e, "server::run returned error");
            std::process::ExitCode::FAILURE
        }
    }
}
