use axum::response::Html;

/// The whole UI is this one page; everything else is the caption endpoint.
static INDEX_HTML: &str = include_str!("../../static/index.html");

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
