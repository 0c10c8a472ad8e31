// CORS configuration
// `*` in the allowed origins list means any origin, as the checkout form is
// usually served from a different dev-server port.

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub fn apply_cors(router: Router, allowed_origins: &[String]) -> Router {
    router.layer(cors_layer(allowed_origins))
}
