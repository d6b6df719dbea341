/// Resolution endpoint
/// Resolves a platform identifier to its service, API or resource URL
use crate::{
    directory::{IdentifierKind, PlatformIdentifier},
    error::DirectoryResult,
    AppContext,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    /// Identifier to resolve (e.g., "urn:ads:platform:tenant-service:v2")
    pub urn: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub urn: String,
    pub kind: IdentifierKind,
    pub url: String,
}

pub async fn resolve(
    State(ctx): State<AppContext>,
    Query(params): Query<ResolveParams>,
) -> DirectoryResult<Json<ResolveResponse>> {
    let id = PlatformIdentifier::parse(params.urn.trim())?;

    let url = ctx.directory.resolve(&id).await?;

    Ok(Json(ResolveResponse {
        urn: id.to_string(),
        kind: id.kind(),
        url: url.to_string(),
    }))
}

pub fn routes() -> Router<AppContext> {
    Router::new().route("/resolve", get(resolve))
}
