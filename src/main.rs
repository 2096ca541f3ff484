use insalubre_ranking::handlers;
use insalubre_ranking::storage::RankingStore;
use log::info;
use ntex::web;
use ntex_cors::Cors;
use std::sync::Arc;

#[ntex::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let ranking_path = std::env::var("RANKING_PATH").unwrap_or_else(|_| "ranking.json".into());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let store = Arc::new(RankingStore::new(ranking_path));
    // Surface a corrupt file at startup; requests keep reporting it as 500s.
    let index = store.open_or_empty();
    info!(
        "serving ranking from {} ({} players)",
        store.path().display(),
        index.count()
    );

    info!("Insalubre ranking server starting on {}:{}", host, port);

    web::HttpServer::new(move || {
        web::App::new()
            .state(store.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type", "Authorization"])
                    .max_age(3600)
                    .finish(),
            )
            .configure(handlers::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
