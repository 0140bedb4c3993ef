mod error;
mod fallback;
mod labels;
mod model;
mod preprocess;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use std::env;

use model::{ModelHandle, default_model_path, load_trained_model};
use routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let model_path = default_model_path();
    log::info!("Looking for model artifact at {}", model_path.display());
    let handle = ModelHandle::new(load_trained_model(&model_path).await);
    if handle.is_loaded() {
        log::info!("Model loaded, serving real predictions");
    } else {
        log::warn!("No usable model, serving deterministic fallback predictions only");
    }

    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(web::Data::new(handle.clone()))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
