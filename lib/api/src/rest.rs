use crate::error::ApiError;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use futures_util::TryStreamExt;
use jobmatch_core::MatchResponse;
use jobmatch_matcher::{MatchOrchestrator, Upload};
use serde::Deserialize;
use std::sync::Arc;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// A limit is a small integer; longer form values are rejected unread.
const MAX_LIMIT_FIELD_BYTES: usize = 16;

/// Multipart field holding the CV file.
const CV_FIELD: &str = "cv";

#[derive(Deserialize)]
struct SearchQuery {
    query: Option<String>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<String>,
}

type ApiResult = Result<HttpResponse, ApiError>;

pub struct RestApi;

impl RestApi {
    pub async fn start(orchestrator: Arc<MatchOrchestrator>, port: u16) -> std::io::Result<()> {
        tracing::info!("REST API listening on 0.0.0.0:{}", port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(orchestrator.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route. Handlers expect `web::Data<Arc<MatchOrchestrator>>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/jobs/search/semantic", web::get().to(semantic_search))
        .route("/cv/upload", web::post().to(upload_cv))
        .route("/cv/matches", web::get().to(get_matches));
}

fn user_id(req: &HttpRequest) -> Result<String, ApiError> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::Unauthorized)
}

/// Lenient like the web client expects: anything unparsable means "default".
fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
}

fn envelope(response: MatchResponse) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": response.message,
        "data": response,
    }))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "name": "jobmatch",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn semantic_search(
    orchestrator: web::Data<Arc<MatchOrchestrator>>,
    query: web::Query<SearchQuery>,
) -> ApiResult {
    let query = query.into_inner().query.unwrap_or_default();
    let outcome = orchestrator.search_by_text(&query).await?;
    tracing::info!("Search for {:?}: {} results ({:?})", query, outcome.results.len(), outcome.mode);
    Ok(HttpResponse::Ok().json(outcome.results))
}

async fn get_matches(
    req: HttpRequest,
    orchestrator: web::Data<Arc<MatchOrchestrator>>,
    query: web::Query<LimitQuery>,
) -> ApiResult {
    let user_id = user_id(&req)?;
    let limit = parse_limit(query.limit.as_deref());
    let response = orchestrator.match_from_profile(&user_id, limit).await?;
    Ok(envelope(response))
}

async fn upload_cv(
    req: HttpRequest,
    orchestrator: web::Data<Arc<MatchOrchestrator>>,
    query: web::Query<LimitQuery>,
    mut payload: Multipart,
) -> ApiResult {
    let user_id = user_id(&req)?;
    let max_bytes = orchestrator.config().max_upload_bytes;

    let mut upload: Option<Upload> = None;
    // A limit in the form body wins over the query string
    let mut body_limit: Option<String> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            CV_FIELD => {
                let media_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_default();
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
                {
                    if bytes.len() + chunk.len() > max_bytes {
                        return Err(ApiError::PayloadTooLarge(max_bytes));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                upload = Some(Upload {
                    bytes,
                    media_type,
                    filename,
                });
            }
            "limit" => {
                let mut raw = Vec::new();
                while let Some(chunk) = field
                    .try_next()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
                {
                    if raw.len() + chunk.len() > MAX_LIMIT_FIELD_BYTES {
                        return Err(ApiError::BadRequest("limit field is too long".into()));
                    }
                    raw.extend_from_slice(&chunk);
                }
                body_limit = Some(String::from_utf8_lossy(&raw).into_owned());
            }
            _ => {
                // Drain unknown fields so the stream can advance
                while field
                    .try_next()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
                    .is_some()
                {}
            }
        }
    }

    let upload = upload.ok_or_else(|| {
        ApiError::Match(jobmatch_matcher::MatchError::Validation(
            jobmatch_matcher::messages::NO_FILE.into(),
        ))
    })?;
    let limit = parse_limit(body_limit.as_deref().or(query.limit.as_deref()));

    tracing::info!(
        "CV upload from {}: {} bytes, {}",
        user_id,
        upload.bytes.len(),
        upload.media_type
    );
    let response = orchestrator.match_from_upload(&user_id, upload, limit).await?;
    Ok(envelope(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use actix_web::test;
    use async_trait::async_trait;
    use jobmatch_core::{CandidateDocument, JobStatus, MatchConfig, Vector};
    use jobmatch_extract::{DocumentExtractor, ExtractError, MIME_PDF};
    use jobmatch_matcher::{EmbeddingError, EmbeddingModel, EmbeddingProvider, ModelLoader};
    use jobmatch_storage::MemoryStore;

    const BOUNDARY: &str = "jobmatch-test-boundary";

    struct PdfOnly;

    impl DocumentExtractor for PdfOnly {
        fn extract(&self, bytes: &[u8], media_type: &str) -> jobmatch_extract::Result<String> {
            if media_type != MIME_PDF {
                return Err(ExtractError::UnsupportedMediaType(media_type.into()));
            }
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
    }

    struct AxisModel;

    #[async_trait]
    impl EmbeddingModel for AxisModel {
        fn name(&self) -> &str {
            "axis"
        }
        fn dimension(&self) -> usize {
            2
        }
        async fn encode(&self, text: &str) -> Result<Vector, EmbeddingError> {
            if text.to_lowercase().contains("python") {
                Ok(Vector::new(vec![1.0, 0.0]))
            } else {
                Ok(Vector::new(vec![0.0, 1.0]))
            }
        }
    }

    struct AxisLoader;

    #[async_trait]
    impl ModelLoader for AxisLoader {
        async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
            Ok(Arc::new(AxisModel))
        }
    }

    fn orchestrator() -> Arc<MatchOrchestrator> {
        let store = Arc::new(MemoryStore::new());
        store
            .put_documents(vec![
                CandidateDocument::new("py", "Python developer", "Backend services")
                    .with_status(JobStatus::Active)
                    .with_skills(["Python", "Django"])
                    .with_embedding(Vector::new(vec![1.0, 0.0])),
                CandidateDocument::new("chef", "Head chef", "Hotel kitchen")
                    .with_status(JobStatus::Active)
                    .with_skills(["Cooking"])
                    .with_embedding(Vector::new(vec![0.0, 1.0])),
            ])
            .unwrap();

        let provider = Arc::new(EmbeddingProvider::new(AxisLoader));
        Arc::new(
            MatchOrchestrator::new(MatchConfig::default(), store, provider).with_extractor(Arc::new(PdfOnly)),
        )
    }

    fn multipart_body(content_type: &str, file: &[u8], limit: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(limit) = limit {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"limit\"\r\n\r\n{limit}\r\n").as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"cv.pdf\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(user: Option<&str>, body: Vec<u8>) -> test::TestRequest {
        let mut req = test::TestRequest::post().uri("/cv/upload").insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ));
        if let Some(user) = user {
            req = req.insert_header((USER_ID_HEADER, user));
        }
        req.set_payload(body)
    }

    macro_rules! app {
        ($orch:expr) => {
            test::init_service(App::new().app_data(web::Data::new($orch)).configure(configure)).await
        };
    }

    const CV: &[u8] = b"Experienced Python engineer building data pipelines and REST services for retail.";

    #[actix_web::test]
    async fn test_health() {
        let app = app!(orchestrator());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_semantic_search_returns_plain_array() {
        let app = app!(orchestrator());
        let req = test::TestRequest::get()
            .uri("/jobs/search/semantic?query=python%20developer")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["id"], "py");
        assert_eq!(results[0]["normalizedScore"], 100);
        assert!(results[0].get("embedding").is_none());
    }

    #[actix_web::test]
    async fn test_semantic_search_requires_query() {
        let app = app!(orchestrator());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/jobs/search/semantic").to_request()).await;
        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Query parameter is required");
    }

    #[actix_web::test]
    async fn test_matches_without_profile() {
        let app = app!(orchestrator());
        let req = test::TestRequest::get()
            .uri("/cv/matches")
            .insert_header((USER_ID_HEADER, "u1"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["total"], 0);
        assert_eq!(body["message"], "No CV uploaded yet. Upload a CV to get matches.");
    }

    #[actix_web::test]
    async fn test_identity_required() {
        let app = app!(orchestrator());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/cv/matches").to_request()).await;
        assert_eq!(resp.status().as_u16(), 401);

        let resp = test::call_service(&app, upload_request(None, multipart_body(MIME_PDF, CV, None)).to_request()).await;
        assert_eq!(resp.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn test_upload_then_matches() {
        let app = app!(orchestrator());

        let req = upload_request(Some("u1"), multipart_body(MIME_PDF, CV, Some("1"))).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "CV processed and matches retrieved");
        assert_eq!(body["data"]["total"], 1);
        assert_eq!(body["data"]["semanticCount"], 1);
        assert_eq!(body["data"]["matches"][0]["id"], "py");
        assert_eq!(body["data"]["matches"][0]["matchingSkills"][0], "Python");
        assert!(body["data"].get("fallback").is_none());

        let req = test::TestRequest::get()
            .uri("/cv/matches?limit=5")
            .insert_header((USER_ID_HEADER, "u1"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total"], 2);
        assert_eq!(body["data"]["matches"][0]["id"], "py");
    }

    #[actix_web::test]
    async fn test_upload_rejects_unsupported_type() {
        let app = app!(orchestrator());
        let req = upload_request(Some("u1"), multipart_body("image/png", CV, None)).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 415);
    }

    #[actix_web::test]
    async fn test_upload_without_file() {
        let app = app!(orchestrator());
        let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"limit\"\r\n\r\n5\r\n--{BOUNDARY}--\r\n");
        let resp = test::call_service(&app, upload_request(Some("u1"), body.into_bytes()).to_request()).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_upload_rejects_long_limit_field() {
        let app = app!(orchestrator());
        let limit = "9".repeat(64);
        let req = upload_request(Some("u1"), multipart_body(MIME_PDF, CV, Some(&limit))).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "limit field is too long");
    }

    #[::core::prelude::v1::test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(Some(" 7 ")), Some(7));
        assert_eq!(parse_limit(Some("abc")), None);
        assert_eq!(parse_limit(Some("-3")), None);
        assert_eq!(parse_limit(None), None);
    }
}
