use crate::agent::ChatAgent;
use crate::models::api::{
    ChatRequest,
    ChatResponse,
    ClearResponse,
    ImageGenerationRequest,
    ImageGenerationResponse,
};
use crate::models::chat::Message;
use super::error::ApiError;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ Path, State },
    extract::rejection::JsonRejection,
};
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use log::{ error, info };

#[derive(Clone)]
pub struct AppState {
    pub agent: ChatAgent,
}

#[derive(Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub provider: String,
    pub model: &'static str,
}

pub fn create_router(agent: ChatAgent) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/conversations/{session_id}/messages", get(messages_handler))
        .route("/api/conversations/{session_id}", axum::routing::delete(clear_handler))
        .route("/api/generate-image", post(generate_image_handler))
        .route("/api/models", get(models_handler))
        .layer(cors)
        .with_state(AppState { agent })
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    match state.agent.process_message(request).await {
        Ok(response) => {
            info!("Chat turn completed for session {}", response.session_id);
            Ok(Json(response))
        }
        Err(e) => {
            error!("Chat error: {}", e);
            Err(e.into())
        }
    }
}

async fn messages_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.agent.get_messages(&session_id).await.map_err(|e| {
        error!("Get messages error: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(messages))
}

async fn clear_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.agent.clear_conversation(&session_id).await.map_err(|e| {
        error!("Clear conversation error: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(ClearResponse {
        message: "Conversation cleared successfully".into(),
    }))
}

async fn generate_image_handler(
    State(state): State<AppState>,
    payload: Result<Json<ImageGenerationRequest>, JsonRejection>,
) -> Result<Json<ImageGenerationResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    let response = state.agent.generate_image(request).await.map_err(|e| {
        error!("Image generation error: {}", e);
        ApiError::from(e)
    })?;
    Ok(Json(response))
}

async fn models_handler(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    let models = state.agent
        .router()
        .registry()
        .models()
        .iter()
        .map(|m| ModelInfo {
            id: m.id,
            provider: m.provider().to_string(),
            model: m.model,
        })
        .collect();
    Json(models)
}
