use actix_files as fs;
use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};

use inspair_health::config::AppConfig;
use inspair_health::state::AppState;
use inspair_health::web::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Inspair.Health backend");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    };

    if config.completion.api_key.is_none() {
        warn!("OPENROUTER_API_KEY not set; chat requests will fail with a configuration error");
    }
    if config.news.api_key.is_none() {
        warn!("NEWSAPI_KEY not set; live posts will be unavailable");
    }
    if config.mail.username.is_none() || config.mail.password.is_none() {
        warn!("EMAIL_HOST_USER/EMAIL_HOST_PASSWORD not set; contact form cannot send mail");
    }

    let app_state = match AppState::from_config(&config) {
        Ok(state) => Data::new(state),
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let static_dir = config.server.static_dir.clone();
    info!("Listening on {}:{}", config.server.host, config.server.port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/static", &static_dir))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
