//! HTTP span helpers.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = normalise_path_for_span_name(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Replace uuid segments with the route parameter they fill, so
/// `/api/books/0190.../reviews` becomes `/api/books/{book}/reviews`.
fn normalise_path_for_span_name(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut normalised = String::from("/");
    let mut previous = "";

    for (index, segment) in path.trim_start_matches('/').split('/').enumerate() {
        if index > 0 {
            normalised.push('/');
        }

        if Uuid::parse_str(segment).is_ok() {
            normalised.push_str(route_param(previous));
        } else {
            normalised.push_str(segment);
        }

        previous = segment;
    }

    normalised
}

fn route_param(collection: &str) -> &'static str {
    match collection {
        "books" | "items" => "{book}",
        "orders" => "{order}",
        "reviews" => "{review}",
        _ => "{uuid}",
    }
}
