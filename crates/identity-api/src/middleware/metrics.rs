//! HTTP 요청 metrics middleware.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    record_http_duration, record_http_request, record_http_response, UNMATCHED_ROUTE,
};

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// 각 요청에 대해 다음 메트릭을 기록합니다:
/// - `http_requests_total`: 총 요청 수 (method, path 라벨)
/// - `http_responses_total`: 총 응답 수 (method, path, status 라벨)
/// - `http_request_duration_seconds`: 요청 처리 시간 히스토그램
///
/// `path` 라벨은 실제 경로가 아닌 라우트 템플릿(`/users/find/{username}`)이며,
/// 매칭된 라우트가 없으면 [`UNMATCHED_ROUTE`]입니다.
/// 접근 정책에 거부된 요청(401/403)도 기록됩니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = route_label(&request);

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    fn app() -> Router {
        Router::new()
            .route("/users/get/{id}", get(ok_handler))
            .route("/users/find/{username}", get(ok_handler))
            .layer(middleware::from_fn(metrics_layer))
    }

    /// 스레드 로컬 레코더로 요청들을 처리하고 렌더링 결과를 반환.
    fn render_after(uris: &[&str]) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                for uri in uris {
                    let request = Request::builder()
                        .uri(*uri)
                        .body(Body::empty())
                        .unwrap();
                    app().oneshot(request).await.unwrap();
                }
            })
        });

        handle.render()
    }

    #[tokio::test]
    async fn test_metrics_middleware_passes_response_through() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/users/get/123e4567-e89b-12d3-a456-426614174000")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_middleware_unknown_route() {
        let request = Request::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_path_label_is_route_template() {
        let rendered = render_after(&["/users/find/alice", "/users/get/42"]);

        assert!(rendered.contains(r#"path="/users/find/{username}""#));
        assert!(rendered.contains(r#"path="/users/get/{id}""#));
        assert!(!rendered.contains("alice"));
    }

    #[test]
    fn test_unmatched_paths_share_one_label() {
        let rendered = render_after(&["/random-path-12a", "/another/random/path"]);

        assert!(rendered.contains(r#"path="unmatched""#));
        assert!(!rendered.contains("random"));
        let requests = rendered
            .lines()
            .find(|line| line.starts_with("http_requests_total{"))
            .unwrap();
        assert!(requests.contains(r#"path="unmatched""#));
        assert!(requests.ends_with(" 2"));
    }
}
