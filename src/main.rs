use vendyz_prices::{
    arguments::{config_path, is_help_requested, port_override, print_help},
    config::Config,
    logger::{self, LogTag},
    prices::PriceService,
    webserver::{self, state::AppState},
};

/// Price proxy entry point
///
/// Loads configuration, builds the provider chain and serves `/api/prices`
/// until Ctrl+C.
#[tokio::main]
async fn main() {
    logger::init();

    if is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "Vendyz price proxy starting up...");

    let path = config_path();
    let mut config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            logger::error(LogTag::Config, &format!("Failed to load {}: {:#}", path, e));
            logger::flush();
            std::process::exit(1);
        }
    };
    if let Some(port) = port_override() {
        config.server.port = port;
    }
    logger::debug(LogTag::Config, &format!("Loaded configuration from {}", path));

    let prices = match PriceService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            logger::error(LogTag::System, &format!("Failed to build price service: {:#}", e));
            logger::flush();
            std::process::exit(1);
        }
    };

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::info(LogTag::System, "Ctrl+C received, shutting down...");
            webserver::shutdown();
        }
    });

    let result = webserver::start_server(AppState::new(config, prices)).await;
    if let Err(e) = &result {
        logger::error(LogTag::Webserver, e);
    }

    logger::info(LogTag::System, "Vendyz price proxy stopped");
    logger::flush();

    if result.is_err() {
        std::process::exit(1);
    }
}
