use std::sync::Arc;

use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;

use crate::cache::OrderLookup;
use crate::metrics::Metrics;

/// Shared state for every handler. Reads only ever touch the cache.
pub struct AppState {
    pub lookup: Arc<dyn OrderLookup>,
    pub metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub id: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/order", web::get().to(order_by_query))
        .route("/order/{id}", web::get().to(order_by_path))
        .route("/health", web::get().to(health_handler))
        .route("/metrics", web::get().to(metrics_handler));
}

async fn order_by_query(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> impl Responder {
    lookup_order(&state, query.id.as_deref().unwrap_or_default())
}

async fn order_by_path(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    lookup_order(&state, &path)
}

fn lookup_order(state: &AppState, order_uid: &str) -> HttpResponse {
    if order_uid.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Order ID is required"
        }));
    }

    match state.lookup.lookup(order_uid) {
        Some(order) => {
            tracing::debug!(order_uid = %order_uid, "Order requested");
            HttpResponse::Ok().json(order.as_ref())
        }
        None => HttpResponse::NotFound().json(serde_json::json!({
            "error": "Order not found"
        })),
    }
}

async fn health_handler(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "cache_size": state.lookup.snapshot_size(),
        "service": "order-ingest"
    }))
}

async fn metrics_handler(state: web::Data<AppState>) -> impl Responder {
    state.metrics.set_cache_size(state.lookup.snapshot_size());

    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::OrderCache;
    use crate::domain::order::{Delivery, Item, Order};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn order(uid: &str) -> Order {
        Order {
            order_uid: uid.to_string(),
            track_number: "WBILMTESTTRACK".to_string(),
            delivery: Delivery { name: "Test Testov".to_string(), ..Default::default() },
            items: vec![Item { name: "Mascaras".to_string(), ..Default::default() }],
            ..Default::default()
        }
    }

    fn state_with(orders: &[Order]) -> web::Data<AppState> {
        let cache = Arc::new(OrderCache::new());
        for order in orders {
            cache.set(order.clone());
        }
        web::Data::new(AppState {
            lookup: cache,
            metrics: Arc::new(Metrics::new().unwrap()),
        })
    }

    #[actix_web::test]
    async fn test_order_found_by_query() {
        let app = test::init_service(App::new().app_data(state_with(&[order("X1")])).configure(configure)).await;

        let req = test::TestRequest::get().uri("/order?id=X1").to_request();
        let body: Order = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, order("X1"));
    }

    #[actix_web::test]
    async fn test_order_found_by_path() {
        let app = test::init_service(App::new().app_data(state_with(&[order("X1")])).configure(configure)).await;

        let req = test::TestRequest::get().uri("/order/X1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["order_uid"], "X1");
        assert_eq!(body["delivery"]["name"], "Test Testov");
    }

    #[actix_web::test]
    async fn test_id_is_matched_exactly_as_ingested() {
        let app = test::init_service(App::new().app_data(state_with(&[order("X1 ")])).configure(configure)).await;

        let req = test::TestRequest::get().uri("/order?id=X1%20").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["order_uid"], "X1 ");

        let req = test::TestRequest::get().uri("/order?id=X1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_unknown_order_is_404() {
        let app = test::init_service(App::new().app_data(state_with(&[])).configure(configure)).await;

        let req = test::TestRequest::get().uri("/order?id=missing").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Order not found");
    }

    #[actix_web::test]
    async fn test_missing_id_is_400() {
        let app = test::init_service(App::new().app_data(state_with(&[])).configure(configure)).await;

        for uri in ["/order", "/order?id="] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "uri {uri}");
        }
    }

    #[actix_web::test]
    async fn test_health_reports_cache_size() {
        let app = test::init_service(
            App::new().app_data(state_with(&[order("A"), order("B")])).configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache_size"], 2);
    }

    #[actix_web::test]
    async fn test_metrics_exposition() {
        let app = test::init_service(App::new().app_data(state_with(&[order("A")])).configure(configure)).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("cache_orders 1"));
    }
}
