mod cache;
mod catalog;
mod classifier;
mod config;
mod recommender;
mod routes;
mod state;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use catalog::Catalog;
use classifier::network::{NetworkWeights, SkinNetwork};
use config::AppConfig;
use routes::configure_routes;
use state::AppState;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

fn startup_error(message: String) -> std::io::Error {
    log::error!("{}", message);
    std::io::Error::other(message)
}

fn load_catalog(path: &str) -> std::io::Result<Catalog> {
    let file = File::open(path)
        .map_err(|e| startup_error(format!("Failed to open catalog {}: {}", path, e)))?;
    let catalog = Catalog::from_csv_reader(BufReader::new(file))
        .map_err(|e| startup_error(format!("Failed to parse catalog {}: {}", path, e)))?;

    if let Err(e) = catalog.schema() {
        log::warn!("Catalog {} cannot serve recommendations: {}", path, e);
    }
    Ok(catalog)
}

/// Weights are optional. Without them the image path uses the brightness
/// heuristic only and `/predict` answers 503.
fn load_network(config: &AppConfig) -> std::io::Result<Option<SkinNetwork>> {
    let Ok(path) = env::var("MODEL_WEIGHTS_PATH") else {
        log::info!("MODEL_WEIGHTS_PATH not set, image classification uses the brightness heuristic");
        return Ok(None);
    };

    let file = File::open(&path)
        .map_err(|e| startup_error(format!("Failed to open model weights {}: {}", path, e)))?;
    let network = NetworkWeights::from_json_reader(BufReader::new(file))
        .and_then(|weights| SkinNetwork::new(weights, config.network.labels.clone()))
        .map(|network| network.with_channel_order(config.network.channel_order))
        .map_err(|e| startup_error(format!("Model loading failed: {}", e)))?;

    log::info!(
        "Loaded model weights from {} ({} classes, {:?} input)",
        path,
        network.classes(),
        config.network.channel_order
    );
    Ok(Some(network))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config =
        AppConfig::load().map_err(|e| startup_error(format!("Config loading failed: {}", e)))?;

    let catalog_path = env::var("CATALOG_PATH")
        .map_err(|_| startup_error("CATALOG_PATH environment variable not set".to_string()))?;
    let catalog = Arc::new(load_catalog(&catalog_path)?);
    let network = load_network(&config)?;

    let state = web::Data::new(AppState::new(&config, catalog, network));

    let port = env::var("PORT").unwrap_or_else(|_| "8081".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
