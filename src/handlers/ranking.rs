use crate::error::AppError;
use crate::models::ranking::*;
use crate::services::ranking as service;
use crate::storage::RankingStore;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

const DEFAULT_TOP: i64 = 10;

// Every request reads the last persisted ranking; nothing here writes.

pub async fn get_ranking(
    store: web::types::State<Arc<RankingStore>>,
    query: web::types::Query<RankingQuery>,
) -> Result<HttpResponse, AppError> {
    let index = store.open()?;
    let report = service::get_ranking(&index, query.limit)?;
    Ok(HttpResponse::Ok().json(&report))
}

pub async fn get_top(
    store: web::types::State<Arc<RankingStore>>,
    query: web::types::Query<TopQuery>,
) -> Result<HttpResponse, AppError> {
    let index = store.open()?;
    let entries = service::get_top(&index, query.n.unwrap_or(DEFAULT_TOP))?;
    Ok(HttpResponse::Ok().json(&entries))
}

pub async fn get_player(
    store: web::types::State<Arc<RankingStore>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();
    let index = store.open()?;
    let detail = service::get_player(&index, &name)?;
    Ok(HttpResponse::Ok().json(&detail))
}

pub async fn get_stats(
    store: web::types::State<Arc<RankingStore>>,
) -> Result<HttpResponse, AppError> {
    let index = store.open()?;
    Ok(HttpResponse::Ok().json(&service::get_stats(&index)))
}
