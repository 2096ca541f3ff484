pub mod ranking;

use ntex::web;

/// Read-only reporting routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health))
        .route("/api/ranking", web::get().to(ranking::get_ranking))
        .route("/api/top", web::get().to(ranking::get_top))
        .route("/api/player/{name}", web::get().to(ranking::get_player))
        .route("/api/stats", web::get().to(ranking::get_stats));
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
