use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::Recommender;
use crate::models::{
    CandidateDetailsResponse, ErrorResponse, HealthResponse, RecommendRequest, RecommendResponse,
};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/recommendations", web::post().to(recommend))
        .route("/recommendations/candidates", web::post().to(candidate_details));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let catalog_size = state.recommender.catalog().len();
    let status = if catalog_size > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size,
        timestamp: chrono::Utc::now(),
    })
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Recommendations endpoint
///
/// POST /api/v1/recommendations
///
/// Request body:
/// ```json
/// {
///   "originalQuery": "flowy dress for a summer wedding",
///   "attributes": {
///     "category": {"values": ["dress"], "confidence": 0.95},
///     "occasion": {"values": ["wedding", "party"], "confidence": 0.8}
///   },
///   "priceRange": {"maxPrice": 120},
///   "conversationHistory": ["user: ...", "assistant: ..."],
///   "useLlmRanking": true
/// }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommend request: {:?}", errors);
        return validation_error(errors);
    }

    let request_id = uuid::Uuid::new_v4().to_string();
    let query = req.to_query();

    tracing::info!(
        request_id = %request_id,
        session_id = ?req.session_id,
        attributes = query.attributes.len(),
        ranked = req.use_llm_ranking,
        "Finding recommendations"
    );

    let result = if req.use_llm_ranking {
        state.recommender.recommend(&query).await
    } else {
        state.recommender.recommend_unranked(&query)
    };

    tracing::info!(
        request_id = %request_id,
        outcome = ?result.outcome,
        returned = result.items.len(),
        candidates = result.candidates.len(),
        "Returning recommendations"
    );

    HttpResponse::Ok().json(RecommendResponse {
        request_id,
        outcome: result.outcome,
        candidate_count: result.candidates.len(),
        relaxations: result.candidates.relaxations,
        recommendations: result.items,
    })
}

/// Stage 1 details endpoint
///
/// POST /api/v1/recommendations/candidates
async fn candidate_details(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let result = state.recommender.find_candidates(&req.to_query());

    HttpResponse::Ok().json(CandidateDetailsResponse {
        total_candidates: result.len(),
        active_filters: result.filters.names(),
        target_reached: result.target_reached,
        relaxations: result.relaxations,
        candidates: result.products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ranker::{LlmRanker, RankerSettings, RankingBackend};
    use crate::core::{ProductCatalog, ProgressiveMatcher};
    use crate::services::LlmError;
    use actix_web::{test, App};

    struct EchoFirstBackend;

    #[async_trait::async_trait]
    impl RankingBackend for EchoFirstBackend {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Ok(r#"{"rankings": [{"product_id": "p1", "score": 88, "reasoning": "classic"}]}"#.to_string())
        }
    }

    fn create_state() -> AppState {
        let catalog = ProductCatalog::from_json(
            r#"[
                {"id": "p1", "name": "Little Black Dress", "price": 70, "category": "dress"},
                {"id": "p2", "name": "White Tee", "price": 15, "category": "top"}
            ]"#,
        )
        .unwrap();
        let ranker = LlmRanker::new(Arc::new(EchoFirstBackend), RankerSettings::default());
        AppState {
            recommender: Arc::new(Recommender::new(
                Arc::new(catalog),
                ProgressiveMatcher::default(),
                ranker,
            )),
        }
    }

    #[actix_web::test]
    async fn test_health_check_response() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(create_state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.catalog_size, 2);
    }

    #[actix_web::test]
    async fn test_recommend_returns_ranked_items() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(create_state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations")
            .set_json(serde_json::json!({"originalQuery": "something black"}))
            .to_request();
        let resp: RecommendResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.recommendations.len(), 1);
        assert_eq!(resp.recommendations[0].product.id, "p1");
        assert_eq!(resp.candidate_count, 2);
    }

    #[actix_web::test]
    async fn test_recommend_rejects_empty_query() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(create_state()))
                .configure(crate::routes::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/recommendations")
            .set_json(serde_json::json!({"originalQuery": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
