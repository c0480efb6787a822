use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, web};
use futures::{StreamExt, TryStreamExt};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::{
    ClassificationResult, PredictResponse, QUIZ_QUESTIONS, QuizAnswer, QuizRequest,
    RecommendationResult, SkinType, WizardTransitionRequest, WizardTransitionResponse,
};
use std::collections::HashMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::classifier::{Classify, ClassifyError, ManualClassifier, combine};
use crate::recommender::RecommendError;
use crate::state::{AppState, ImageError, decode_image};

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,
    #[error("Provide an image, quiz answers or a skin type")]
    NoInput,
    #[error("Upload error: {0}")]
    Upload(String),
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("{0}")]
    Classify(#[from] ClassifyError),
    #[error("Unknown skin type: {0}")]
    UnknownSkinType(String),
    #[error("Model weights are not configured")]
    ModelUnavailable,
    #[error("{0}")]
    Recommend(#[from] RecommendError),
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Decode(message) => ApiError::Decode(message),
            ImageError::Classify(e) => ApiError::Classify(e),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Recommend(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub id: Uuid,
    pub result: ClassificationResult,
    pub candidates: Vec<ClassificationResult>,
    pub recommendations: Option<RecommendationResult>,
    pub recommendation_error: Option<String>,
}

#[derive(Deserialize)]
pub struct RecommendationQuery {
    pub skin_type: String,
    pub limit: Option<usize>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/api/classify").route(web::post().to(classify)))
        .service(web::resource("/api/quiz").route(web::post().to(classify_quiz)))
        .service(web::resource("/api/questions").route(web::get().to(questions)))
        .service(web::resource("/api/recommendations").route(web::get().to(recommendations)))
        .service(web::resource("/api/wizard/transition").route(web::post().to(wizard_transition)));
}

async fn read_fields(mut payload: Multipart) -> Result<HashMap<String, Vec<u8>>, ApiError> {
    let mut fields = HashMap::new();
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Upload(e.to_string()))?
    {
        let name = field.name().map(str::to_string).unwrap_or_default();
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::Upload(e.to_string()))?;
            data.extend_from_slice(&chunk);
        }
        if !data.is_empty() {
            fields.insert(name, data);
        }
    }
    Ok(fields)
}

fn parse_skin_type(raw: &str) -> Result<SkinType, ApiError> {
    SkinType::from_str(raw.trim()).map_err(|_| ApiError::UnknownSkinType(raw.trim().to_string()))
}

/// Accepts either a JSON array of tiers or a comma-separated list.
fn parse_quiz_field(raw: &[u8]) -> Result<Vec<String>, ApiError> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.starts_with('[') {
        serde_json::from_str(text).map_err(|e| {
            ApiError::Classify(ClassifyError::InvalidInput(format!(
                "quiz answers are not a JSON string array: {}",
                e
            )))
        })
    } else {
        Ok(text.split(',').map(|s| s.trim().to_string()).collect())
    }
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "catalog_rows": state.recommender.catalog().len(),
        "model_loaded": state.network.is_some(),
        "cached_classifications": state.cache.len(),
    }))
}

async fn predict(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let mut fields = read_fields(payload).await?;
    let image_data = fields.remove("file").ok_or(ApiError::NoFile)?;
    let network = state.network.as_ref().ok_or(ApiError::ModelUnavailable)?;

    let image = decode_image(&image_data)?;
    let prediction = network.predict(&image)?;
    info!(
        "Predicted class {} with confidence {:.3}",
        prediction.class_index, prediction.confidence
    );
    log::debug!("Class probabilities {:?}", prediction.probabilities);
    Ok(HttpResponse::Ok().json(PredictResponse::from(&prediction)))
}

async fn classify(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let mut fields = read_fields(payload).await?;
    let mut candidates = Vec::new();

    if let Some(image_data) = fields.remove("image") {
        candidates.extend(state.classify_image(&image_data)?);
    }
    if let Some(raw) = fields.remove("quiz") {
        let answers = parse_quiz_field(&raw)?;
        candidates.push(state.quiz.classify_text(&answers)?);
    }
    if let Some(raw) = fields.remove("skin_type") {
        let label = parse_skin_type(&String::from_utf8_lossy(&raw))?;
        candidates.push(ManualClassifier.classify(&label)?);
    }

    let result = combine(candidates.iter().copied()).ok_or(ApiError::NoInput)?;
    let id = Uuid::new_v4();
    info!("Classification {} -> {} via {}", id, result.label, result.source);

    // a broken catalog only costs the recommendations, not the classification
    let (recommendations, recommendation_error) = match state.recommender.recommend(result.label, None) {
        Ok(found) => (Some(found), None),
        Err(e) => {
            error!("Recommendation failed for {}: {}", id, e);
            (None, Some(e.to_string()))
        }
    };

    Ok(HttpResponse::Ok().json(ClassifyResponse {
        id,
        result,
        candidates,
        recommendations,
        recommendation_error,
    }))
}

async fn classify_quiz(
    state: web::Data<AppState>,
    request: web::Json<QuizRequest>,
) -> Result<HttpResponse, ApiError> {
    let result = state.quiz.classify_text(&request.answers)?;
    Ok(HttpResponse::Ok().json(result))
}

async fn questions() -> HttpResponse {
    let tiers: Vec<_> = QuizAnswer::iter()
        .map(|answer| json!({ "tier": answer.to_string(), "weight": answer.weight() }))
        .collect();
    HttpResponse::Ok().json(json!({
        "questions": QUIZ_QUESTIONS,
        "tiers": tiers,
    }))
}

async fn recommendations(
    state: web::Data<AppState>,
    query: web::Query<RecommendationQuery>,
) -> Result<HttpResponse, ApiError> {
    let label = parse_skin_type(&query.skin_type)?;
    let result = state.recommender.recommend(label, query.limit)?;
    if result.is_empty() {
        info!("No products found for {}", label);
    }
    Ok(HttpResponse::Ok().json(result))
}

async fn wizard_transition(request: web::Json<WizardTransitionRequest>) -> HttpResponse {
    let step = request.step.transition(request.action);
    HttpResponse::Ok().json(WizardTransitionResponse { step })
}
