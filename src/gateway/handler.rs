use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::error::GatewayError;
use super::payload::{Identifier, SearchRequest, SearchResponse};
use super::state::AppState;
use super::status::{ETALON_STATUS_HEADER, SearchStatus};
use crate::classifier::Query;
use crate::config::SysPubMapping;
use crate::constants::DEFAULT_SCENARIO;
use crate::retrieval::RetrievalBackend;

#[instrument(
    skip(state, request),
    fields(
        request_id = %Uuid::new_v4(),
        pub_id = tracing::field::Empty,
        sys_id = tracing::field::Empty,
    )
)]
pub async fn search_handler<B>(
    State(state): State<AppState<B>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError>
where
    B: RetrievalBackend + Clone + Send + Sync + 'static,
{
    let request: SearchRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {e}")))?;

    if request.text.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("text must not be empty".to_string()));
    }

    let sys_id = resolve_sys_id(&request, &state.mapping);
    let span = tracing::Span::current();
    span.record("pub_id", request.pubid);
    span.record("sys_id", tracing::field::display(&sys_id));

    let chat_id = request.chat_id.and_then(Identifier::into_key);
    debug!(
        chat_id = chat_id.as_deref().unwrap_or_default(),
        userid = request.userid,
        "Processing search request"
    );

    let query = Query::new(request.text, request.pubid, sys_id);
    let result = state.orchestrator.classify(&query).await?;

    Ok(make_response(result.into(), SearchStatus::Matched))
}

/// Explicit `sys_id`, else the mapping for the publication, else the default scenario.
pub(crate) fn resolve_sys_id(request: &SearchRequest, mapping: &SysPubMapping) -> String {
    request
        .sys_id
        .clone()
        .and_then(|sys_id| sys_id.into_key())
        .or_else(|| mapping.sys_id_for(request.pubid).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_SCENARIO.to_string())
}

pub(crate) fn make_response(payload: SearchResponse, status: SearchStatus) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        ETALON_STATUS_HEADER,
        HeaderValue::from_static(status.as_header_value()),
    );
    (StatusCode::OK, headers, Json(payload)).into_response()
}
