use crate::error::ApiError;
use crate::extract::ValidatedJson;
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::HeaderValue,
    routing::get,
    Json, Router,
};
use clientbench_core::domain::{Company, CompanyFinancialDataset, FinancialMetrics};
use clientbench_core::service::{FinancialDataService, MetricsAck};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub service: FinancialDataService,
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/api/companies", get(list_companies))
        .route("/api/companies/clients", get(list_clients))
        .route("/api/companies/competitors", get(list_competitors))
        .route("/api/financial-data", get(list_financial_data))
        .route(
            "/api/financial-data/:ticker",
            get(get_financial_data).post(submit_metrics),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Explicit origin allow-list. Credentials rule out wildcards, so methods and
/// headers mirror the preflight request instead.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

#[derive(Debug, Serialize)]
struct RootMessage {
    message: &'static str,
}

async fn root() -> Json<RootMessage> {
    Json(RootMessage {
        message: "ClientBench API",
    })
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(state.service.list_companies().await?))
}

async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(state.service.list_clients().await?))
}

async fn list_competitors(
    State(state): State<AppState>,
) -> Result<Json<Vec<Company>>, ApiError> {
    Ok(Json(state.service.list_competitors().await?))
}

async fn list_financial_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<CompanyFinancialDataset>>, ApiError> {
    Ok(Json(state.service.list_financial_data().await?))
}

async fn get_financial_data(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<CompanyFinancialDataset>, ApiError> {
    Ok(Json(state.service.financial_data_by_ticker(&ticker).await?))
}

async fn submit_metrics(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    ValidatedJson(metrics): ValidatedJson<FinancialMetrics>,
) -> Result<Json<MetricsAck>, ApiError> {
    Ok(Json(state.service.submit_metrics(&ticker, metrics).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use clientbench_core::service::UpdateMode;
    use clientbench_core::storage::{seed, InMemoryRepository};
    use serde_json::{json, Value};
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tower::ServiceExt;

    const DASHBOARD_ORIGIN: &str = "http://localhost:5173";

    fn app_with_mode(mode: UpdateMode) -> Router {
        let repo = InMemoryRepository::from_datasets(seed::load_embedded().unwrap()).unwrap();
        let state = AppState {
            service: FinancialDataService::new(Arc::new(repo), mode),
        };
        let cors = cors_layer(&[DASHBOARD_ORIGIN.to_string()]).unwrap();
        router(state, cors)
    }

    fn app() -> Router {
        app_with_mode(UpdateMode::Acknowledge)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, req).await
    }

    async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, req).await
    }

    fn tickers(v: &Value) -> BTreeSet<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|c| c["ticker"].as_str().unwrap().to_string())
            .collect()
    }

    fn metrics_payload() -> Value {
        json!({
            "year": 2024,
            "quarter": 2,
            "revenue": 90753000000.0,
            "revenueGrowthRate": 4.9,
            "grossMargin": 46.6,
            "operatingMargin": 29.6,
            "netIncomeMargin": 26.0,
            "ebitdaMargin": 33.0,
            "eps": 1.53,
            "roe": 150.1,
            "roa": 22.0,
            "roic": 29.0,
            "assetTurnoverRatio": 1.1,
            "cogsAsPercentOfRevenue": 53.4,
            "sgaAsPercentOfRevenue": 15.0,
            "rdAndCapexAsPercentOfRevenue": 8.4,
            "revenueGrowthRateYoY": 4.9,
            "revenueGrowthRate3YearCAGR": 8.1,
            "netIncomeGrowth": 7.9,
            "marketShareGrowth": 0.4,
            "currentRatio": 0.98,
            "quickRatio": 0.86,
            "debtToEquity": 1.7,
            "interestCoverageRatio": 29.1,
            "peRatio": 30.2
        })
    }

    #[tokio::test]
    async fn root_returns_message() {
        let (status, body) = get_json(app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "ClientBench API" }));
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn clients_and_competitors_partition_companies() {
        let (s1, all) = get_json(app(), "/api/companies").await;
        let (s2, clients) = get_json(app(), "/api/companies/clients").await;
        let (s3, competitors) = get_json(app(), "/api/companies/competitors").await;
        assert_eq!((s1, s2, s3), (StatusCode::OK, StatusCode::OK, StatusCode::OK));

        let all = tickers(&all);
        let clients_set = tickers(&clients);
        let competitors_set = tickers(&competitors);

        assert!(clients_set.is_disjoint(&competitors_set));
        let union: BTreeSet<String> = clients_set.union(&competitors_set).cloned().collect();
        assert_eq!(union, all);

        assert!(clients
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["isClient"] == json!(true)));
        assert!(competitors
            .as_array()
            .unwrap()
            .iter()
            .all(|c| c["isClient"] == json!(false)));
    }

    #[tokio::test]
    async fn lists_all_financial_datasets() {
        let (status, body) = get_json(app(), "/api/financial-data").await;
        assert_eq!(status, StatusCode::OK);
        let datasets = body.as_array().unwrap();
        assert_eq!(datasets[0]["company"]["ticker"], json!("AAPL"));
        assert!(datasets.iter().all(|d| d["financialMetrics"].is_array()));
        assert!(datasets.iter().all(|d| d["lastUpdated"].is_string()));
    }

    #[tokio::test]
    async fn ticker_lookup_is_case_insensitive() {
        let (s1, upper) = get_json(app(), "/api/financial-data/AAPL").await;
        let (s2, lower) = get_json(app(), "/api/financial-data/aapl").await;
        let (s3, mixed) = get_json(app(), "/api/financial-data/Aapl").await;
        assert_eq!((s1, s2, s3), (StatusCode::OK, StatusCode::OK, StatusCode::OK));
        assert_eq!(upper, lower);
        assert_eq!(upper, mixed);
    }

    #[tokio::test]
    async fn apple_2024_revenue_is_served_unchanged() {
        let (status, body) = get_json(app(), "/api/financial-data/AAPL").await;
        assert_eq!(status, StatusCode::OK);
        let metrics = body["financialMetrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0]["year"], json!(2024));
        assert!(metrics[0].get("quarter").is_none());
        assert_eq!(metrics[0]["revenue"].as_f64(), Some(383285000000.0));
    }

    #[tokio::test]
    async fn unknown_ticker_is_404_with_error_payload() {
        let (status, body) = get_json(app(), "/api/financial-data/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Company not found: NOPE"));
    }

    #[tokio::test]
    async fn post_missing_required_field_is_422() {
        let mut payload = metrics_payload();
        payload.as_object_mut().unwrap().remove("revenue");

        let (status, body) = post_json(app(), "/api/financial-data/AAPL", &payload).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], json!("validation failed"));
        assert_eq!(body["details"][0]["field"], json!("revenue"));
    }

    #[tokio::test]
    async fn post_wrong_type_is_422() {
        let mut payload = metrics_payload();
        payload["grossMargin"] = json!("high");
        let (status, body) = post_json(app(), "/api/financial-data/AAPL", &payload).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["details"].as_array().is_some_and(|d| !d.is_empty()));
    }

    #[tokio::test]
    async fn post_quarter_out_of_range_is_422() {
        let mut payload = metrics_payload();
        payload["quarter"] = json!(7);
        let (status, body) = post_json(app(), "/api/financial-data/AAPL", &payload).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], json!("quarter"));
    }

    #[tokio::test]
    async fn post_without_json_content_type_is_415() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/financial-data/AAPL")
            .body(Body::from(metrics_payload().to_string()))
            .unwrap();
        let (status, _) = send(app(), req).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn post_valid_payload_is_echoed_unchanged() {
        let payload = metrics_payload();
        let (status, body) = post_json(app(), "/api/financial-data/aapl", &payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Financial data updated for AAPL"));

        let sent: FinancialMetrics = serde_json::from_value(payload).unwrap();
        let echoed: FinancialMetrics = serde_json::from_value(body["data"].clone()).unwrap();
        assert_eq!(echoed, sent);
    }

    #[tokio::test]
    async fn acknowledge_mode_does_not_mutate() {
        let app = app();
        let (_, before) = get_json(app.clone(), "/api/financial-data/AAPL").await;
        let (status, _) = post_json(app.clone(), "/api/financial-data/AAPL", &metrics_payload()).await;
        assert_eq!(status, StatusCode::OK);
        let (_, after) = get_json(app, "/api/financial-data/AAPL").await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn apply_mode_stores_new_period() {
        let app = app_with_mode(UpdateMode::Apply);
        let (status, _) = post_json(app.clone(), "/api/financial-data/AAPL", &metrics_payload()).await;
        assert_eq!(status, StatusCode::OK);

        let (_, after) = get_json(app.clone(), "/api/financial-data/AAPL").await;
        let metrics = after["financialMetrics"].as_array().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[1]["quarter"], json!(2));

        let (status, _) = post_json(app, "/api/financial-data/NOPE", &metrics_payload()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_allows_dashboard_origin_with_credentials() {
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/financial-data/AAPL")
            .header(header::ORIGIN, DASHBOARD_ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let headers = resp.headers();

        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            DASHBOARD_ORIGIN
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "POST"
        );
    }

    #[tokio::test]
    async fn cors_ignores_unlisted_origin() {
        let req = Request::builder()
            .uri("/api/companies")
            .header(header::ORIGIN, "http://evil.example.com")
            .body(Body::empty())
            .unwrap();
        let resp = app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[test]
    fn cors_layer_rejects_invalid_origin() {
        assert!(cors_layer(&["http://bad\norigin".to_string()]).is_err());
    }
}
