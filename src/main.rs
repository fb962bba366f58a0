use tracing::{error, info, warn};

use cloudbox::{ensure_admin, Config, Database, UserRepository, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = cloudbox::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        cloudbox::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    info!("cloudbox - personal cloud storage");

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {e}", config.database.path);
            std::process::exit(1);
        }
    };

    match ensure_admin(&UserRepository::new(db.pool()), &config.admin).await {
        Ok(Some(admin)) => {
            warn!(
                username = %admin.username,
                "Created administrator account; change its password"
            );
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to create administrator account: {e}");
            std::process::exit(1);
        }
    }

    let server = match WebServer::new(&config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to set up web server: {e}");
            std::process::exit(1);
        }
    };

    info!("Starting web server on {}", server.addr());
    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        std::process::exit(1);
    }
}
