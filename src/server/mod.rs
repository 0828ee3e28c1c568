//! JSON server over the loaded post indices

use anyhow::Result;
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use indexmap::IndexMap;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::content::{Cover, Post};
use crate::index::{sort_by_date, PostIndex, SortOrder, TagQuery};
use crate::Site;

const TAG_PARAM: &str = "tag";
const SORT_PARAM: &str = "sort";

/// Server state
struct ServerState {
    indices: IndexMap<String, PostIndex>,
}

/// Start the server with indices loaded at startup
pub async fn start(
    site: &Site,
    indices: IndexMap<String, PostIndex>,
    ip: &str,
    port: u16,
) -> Result<()> {
    for (name, index) in &indices {
        tracing::info!("Serving {} {}", index.len(), name);
    }

    let app = router(indices, &site.static_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// API routes over `indices`, with `static_dir` served for everything else
fn router(indices: IndexMap<String, PostIndex>, static_dir: &FsPath) -> Router {
    let state = Arc::new(ServerState { indices });

    Router::new()
        .route("/api/:collection", get(list_handler))
        .route("/api/:collection/:slug", get(post_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One entry of a listing page
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary<'a> {
    pub title: &'a str,
    pub href: &'a str,
    pub description: &'a str,
    pub formatted_date: &'a str,
    pub minutes_to_read: u32,
    pub tags: &'a [String],
    pub cover: &'a Cover,
}

impl<'a> From<&'a Post> for PostSummary<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            title: &post.title,
            href: &post.href,
            description: &post.description,
            formatted_date: &post.formatted_date,
            minutes_to_read: post.minutes_to_read,
            tags: &post.tags,
            cover: &post.cover,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TagFacet {
    pub tag: String,
    pub selected: bool,
}

/// Body of `GET /api/{collection}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<'a> {
    pub posts: Vec<PostSummary<'a>>,
    pub current_sort: &'static str,
    pub sorts: Vec<&'static str>,
    pub tags: Vec<TagFacet>,
}

/// What a listing request resolves to
#[derive(Debug)]
pub enum ListOutcome<'a> {
    /// Some parameters were invalid; retry with this query string
    Redirect(String),
    Page(Listing<'a>),
}

/// Filter and sort `index` per the query parameters.
///
/// Unknown tags and an unknown sort are dropped through a redirect so the
/// address bar always shows what is actually applied.
pub fn list_posts<'a>(index: &'a PostIndex, params: &[(String, String)]) -> ListOutcome<'a> {
    let tags = params
        .iter()
        .filter(|(k, _)| k == TAG_PARAM)
        .map(|(_, v)| v.clone());
    let query = TagQuery::new(index, tags);

    let sort = match params.iter().find(|(k, _)| k == SORT_PARAM) {
        Some((_, value)) => value.parse::<SortOrder>().ok(),
        None => Some(SortOrder::default()),
    };

    let Some(sort) = sort.filter(|_| !query.has_unknown()) else {
        let sort_valid = sort.is_some();
        let kept: Vec<_> = params
            .iter()
            .filter(|(k, v)| match k.as_str() {
                TAG_PARAM => index.has_tag(v),
                SORT_PARAM => sort_valid,
                _ => true,
            })
            .collect();
        return ListOutcome::Redirect(encode_query(&kept));
    };

    let visible = query.apply(index);
    let tags = query
        .facet(&visible)
        .into_iter()
        .map(|(tag, selected)| TagFacet { tag, selected })
        .collect();

    ListOutcome::Page(Listing {
        posts: sort_by_date(visible, sort)
            .into_iter()
            .map(PostSummary::from)
            .collect(),
        current_sort: sort.as_str(),
        sorts: SortOrder::ALL.iter().map(|s| s.as_str()).collect(),
        tags,
    })
}

async fn list_handler(
    State(state): State<Arc<ServerState>>,
    Path(collection): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let Some(index) = state.indices.get(&collection) else {
        return not_found(&format!("no collection named {}", collection));
    };

    let params = parse_query(raw.as_deref().unwrap_or_default());
    match list_posts(index, &params) {
        ListOutcome::Redirect(query) => {
            let target = if query.is_empty() {
                format!("/api/{}", collection)
            } else {
                format!("/api/{}?{}", collection, query)
            };
            Redirect::temporary(&target).into_response()
        }
        ListOutcome::Page(listing) => Json(listing).into_response(),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path((collection, slug)): Path<(String, String)>,
) -> Response {
    match state.indices.get(&collection).and_then(|i| i.get(&slug)) {
        Some(post) => Json(post).into_response(),
        None => not_found(&format!("no post {}/{}", collection, slug)),
    }
}

fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// Decoded query pairs, keeping repeated keys in order
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.as_bytes()).into_owned().collect()
}

fn encode_query(pairs: &[&(String, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
