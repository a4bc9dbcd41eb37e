use std::num::IntErrorKind;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;

use super::domain::{
    LinkDraft, LinkId, LinkLocator, NewTimelineEvent, StartupId, TimelineEvent,
    TimelineEventId, VerificationStatus,
};
use super::repository::{
    RepositoryError, TimelineEventFilter, TimelineEventRepository, TimelineEventView,
};
use super::service::{TimelineEventService, TimelineServiceError};

/// Optional optimistic-concurrency guard. Every mutating route reads it from
/// the query string and from the JSON body; both may be sent only if they agree.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct VersionGuard {
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) startup_id: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<VerificationStatus>,
}

impl From<ListQuery> for TimelineEventFilter {
    fn from(query: ListQuery) -> Self {
        Self {
            startup_id: query.startup_id.map(StartupId),
            status: query.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LinkRequest {
    #[serde(flatten)]
    pub(crate) link: LinkDraft,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

/// Router builder exposing the admin endpoints for timeline events.
pub fn timeline_router<R>(service: Arc<TimelineEventService<R>>) -> Router
where
    R: TimelineEventRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/timeline-events",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id",
            get(show_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id/verify",
            post(verify_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id/unverify",
            post(unverify_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id/mark-needs-improvement",
            post(mark_needs_improvement_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id/links",
            post(add_link_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id/links/:index",
            put(edit_link_handler::<R>).delete(delete_link_handler::<R>),
        )
        .route(
            "/api/v1/timeline-events/:event_id/links/by-id/:link_id",
            put(edit_link_by_id_handler::<R>).delete(delete_link_by_id_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    axum::Json(input): axum::Json<NewTimelineEvent>,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    match service.create(input) {
        Ok(event) => (
            StatusCode::CREATED,
            axum::Json(TimelineEventView::from_event(&event)),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    match service.list(&TimelineEventFilter::from(query)) {
        Ok(events) => {
            let views: Vec<TimelineEventView> =
                events.iter().map(TimelineEventView::from_event).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn show_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path(event_id): Path<String>,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    view_response(StatusCode::OK, service.get(&TimelineEventId(event_id)))
}

pub(crate) async fn verify_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path(event_id): Path<String>,
    Query(query): Query<VersionGuard>,
    body: Bytes,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let expected_version = match guarded_version(query, &body) {
        Ok(version) => version,
        Err(error) => return error.into_response(),
    };
    let result = service.verify(&TimelineEventId(event_id), expected_version);
    view_response(StatusCode::OK, result)
}

pub(crate) async fn unverify_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path(event_id): Path<String>,
    Query(query): Query<VersionGuard>,
    body: Bytes,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let expected_version = match guarded_version(query, &body) {
        Ok(version) => version,
        Err(error) => return error.into_response(),
    };
    let result = service.unverify(&TimelineEventId(event_id), expected_version);
    view_response(StatusCode::OK, result)
}

pub(crate) async fn mark_needs_improvement_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path(event_id): Path<String>,
    Query(query): Query<VersionGuard>,
    body: Bytes,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let expected_version = match guarded_version(query, &body) {
        Ok(version) => version,
        Err(error) => return error.into_response(),
    };
    let result = service.mark_needs_improvement(&TimelineEventId(event_id), expected_version);
    view_response(StatusCode::OK, result)
}

pub(crate) async fn add_link_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path(event_id): Path<String>,
    Query(query): Query<VersionGuard>,
    axum::Json(request): axum::Json<LinkRequest>,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let expected_version = match resolve_version(query, request.expected_version) {
        Ok(version) => version,
        Err(error) => return error.into_response(),
    };
    let result = service.add_link(&TimelineEventId(event_id), expected_version, request.link);
    view_response(StatusCode::CREATED, result)
}

pub(crate) async fn edit_link_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path((event_id, index)): Path<(String, String)>,
    Query(query): Query<VersionGuard>,
    axum::Json(request): axum::Json<LinkRequest>,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let resolved = link_index(&index).and_then(|index| {
        resolve_version(query, request.expected_version).map(|version| (index, version))
    });
    let (index, expected_version) = match resolved {
        Ok(resolved) => resolved,
        Err(error) => return error.into_response(),
    };
    let result = service.edit_link(
        &TimelineEventId(event_id),
        expected_version,
        LinkLocator::Index(index),
        request.link,
    );
    view_response(StatusCode::OK, result)
}

pub(crate) async fn edit_link_by_id_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path((event_id, link_id)): Path<(String, Uuid)>,
    Query(query): Query<VersionGuard>,
    axum::Json(request): axum::Json<LinkRequest>,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let expected_version = match resolve_version(query, request.expected_version) {
        Ok(version) => version,
        Err(error) => return error.into_response(),
    };
    let result = service.edit_link(
        &TimelineEventId(event_id),
        expected_version,
        LinkLocator::Id(LinkId(link_id)),
        request.link,
    );
    view_response(StatusCode::OK, result)
}

pub(crate) async fn delete_link_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path((event_id, index)): Path<(String, String)>,
    Query(query): Query<VersionGuard>,
    body: Bytes,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let resolved = link_index(&index).and_then(|index| {
        guarded_version(query, &body).map(|version| (index, version))
    });
    let (index, expected_version) = match resolved {
        Ok(resolved) => resolved,
        Err(error) => return error.into_response(),
    };
    let result = service
        .delete_link(
            &TimelineEventId(event_id),
            expected_version,
            LinkLocator::Index(index),
        )
        .map(|(event, _removed)| event);
    view_response(StatusCode::OK, result)
}

pub(crate) async fn delete_link_by_id_handler<R>(
    State(service): State<Arc<TimelineEventService<R>>>,
    Path((event_id, link_id)): Path<(String, Uuid)>,
    Query(query): Query<VersionGuard>,
    body: Bytes,
) -> Response
where
    R: TimelineEventRepository + 'static,
{
    let expected_version = match guarded_version(query, &body) {
        Ok(version) => version,
        Err(error) => return error.into_response(),
    };
    let result = service
        .delete_link(
            &TimelineEventId(event_id),
            expected_version,
            LinkLocator::Id(LinkId(link_id)),
        )
        .map(|(event, _removed)| event);
    view_response(StatusCode::OK, result)
}

fn guarded_version(query: VersionGuard, body: &Bytes) -> Result<Option<u64>, AppError> {
    resolve_version(query, body_version(body)?)
}

/// Reads `expected_version` from an optional JSON body. An empty body carries no guard.
fn body_version(body: &Bytes) -> Result<Option<u64>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<VersionGuard>(body)
        .map(|guard| guard.expected_version)
        .map_err(|err| AppError::InvalidRequest(format!("malformed request body: {err}")))
}

fn resolve_version(query: VersionGuard, body: Option<u64>) -> Result<Option<u64>, AppError> {
    match (body, query.expected_version) {
        (Some(body), Some(query)) if body != query => Err(AppError::InvalidRequest(format!(
            "expected_version {body} in the body disagrees with {query} in the query string"
        ))),
        (body, query) => Ok(body.or(query)),
    }
}

/// Positions beyond the `i64` range saturate so they fail as out of range
/// like every other bad position.
fn link_index(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().or_else(|err| match err.kind() {
        IntErrorKind::PosOverflow => Ok(i64::MAX),
        IntErrorKind::NegOverflow => Ok(i64::MIN),
        _ => Err(AppError::InvalidRequest(format!(
            "link index '{raw}' is not an integer"
        ))),
    })
}

fn view_response(
    status: StatusCode,
    result: Result<TimelineEvent, TimelineServiceError>,
) -> Response {
    match result {
        Ok(event) => (status, axum::Json(TimelineEventView::from_event(&event))).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: TimelineServiceError) -> Response {
    if let TimelineServiceError::Repository(RepositoryError::Unavailable(_)) = &error {
        warn!(%error, "timeline repository unavailable");
    }
    AppError::from(error).into_response()
}
