use axum::{
    Json,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{error, info, warn};
use upstream::{FetchError, Source};

pub const RATE_LIMITED_HEADER: HeaderName = HeaderName::from_static("x-rate-limited");
pub const ERROR_HEADER: HeaderName = HeaderName::from_static("x-error");

/// Single record proxy: always 200, `null` in place of anything that failed.
pub fn proxy_record<T>(source: Source, label: &str, fetched: Result<Value, FetchError>) -> Response
where
    T: DeserializeOwned + Serialize,
{
    let (record, flag) = match fetched {
        Ok(value) => match serde_json::from_value::<T>(value) {
            Ok(record) => (Some(record), None),
            Err(e) => {
                error!("Malformed {label} payload: {e}");
                (None, Some(ERROR_HEADER))
            }
        },
        Err(e) => (None, failure_header(source, label, &e)),
    };

    flagged(Json(record), flag)
}

/// List proxy: always 200, `[]` in place of anything that failed.
pub fn proxy_collection<T>(
    source: Source,
    label: &str,
    fetched: Result<Value, FetchError>,
) -> Response
where
    T: DeserializeOwned + Serialize,
{
    let (items, flag) = match fetched {
        Ok(Value::Array(items)) => match items
            .into_iter()
            .map(serde_json::from_value::<T>)
            .collect::<Result<Vec<T>, _>>()
        {
            Ok(items) => (items, None),
            Err(e) => {
                error!("Malformed {label} payload: {e}");
                (Vec::new(), Some(ERROR_HEADER))
            }
        },
        Ok(_) => {
            warn!("Expected {label} to be a list, answering with an empty one");
            (Vec::new(), None)
        }
        Err(e) => (Vec::new(), failure_header(source, label, &e)),
    };

    flagged(Json(items), flag)
}

fn failure_header(source: Source, label: &str, error: &FetchError) -> Option<HeaderName> {
    if error.status() == Some(404) {
        info!("{label} not found");
        None
    } else if source.is_rate_limited(error) {
        warn!("{} rate limit reached for {label}", source.name());
        Some(RATE_LIMITED_HEADER)
    } else {
        error!("Failed to fetch {label}: {error}");
        Some(ERROR_HEADER)
    }
}

fn flagged(body: impl IntoResponse, flag: Option<HeaderName>) -> Response {
    let mut response = body.into_response();
    if let Some(name) = flag {
        response
            .headers_mut()
            .insert(name, HeaderValue::from_static("true"));
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use upstream::{GitHubRepo, GitHubUser, ModrinthUser};

    use super::*;
    use crate::testing;

    #[test]
    fn record_passes_through() {
        let response =
            proxy_record::<GitHubUser>(Source::GitHub, "GitHub user", Ok(testing::github_user()));

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(&ERROR_HEADER).is_none());
        assert!(response.headers().get(&RATE_LIMITED_HEADER).is_none());
    }

    #[test]
    fn failures_stay_ok_and_are_flagged() {
        let limited = proxy_collection::<GitHubRepo>(
            Source::GitHub,
            "GitHub repos",
            Err(testing::status(403)),
        );
        assert_eq!(limited.status(), StatusCode::OK);
        assert_eq!(limited.headers()[&RATE_LIMITED_HEADER], "true");

        let broken = proxy_record::<ModrinthUser>(
            Source::Modrinth,
            "Modrinth user",
            Err(FetchError::Timeout(10_000)),
        );
        assert_eq!(broken.status(), StatusCode::OK);
        assert_eq!(broken.headers()[&ERROR_HEADER], "true");

        // 403 is only a quota signal for GitHub
        let forbidden = proxy_record::<ModrinthUser>(
            Source::Modrinth,
            "Modrinth user",
            Err(testing::status(403)),
        );
        assert_eq!(forbidden.headers()[&ERROR_HEADER], "true");
    }

    #[test]
    fn absence_is_not_flagged() {
        let response =
            proxy_record::<GitHubUser>(Source::GitHub, "GitHub user", Err(testing::status(404)));

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(&ERROR_HEADER).is_none());
        assert!(response.headers().get(&RATE_LIMITED_HEADER).is_none());
    }

    #[test]
    fn malformed_payloads_are_flagged() {
        let record = proxy_record::<GitHubUser>(
            Source::GitHub,
            "GitHub user",
            Ok(serde_json::json!({ "login": 5 })),
        );
        assert_eq!(record.headers()[&ERROR_HEADER], "true");

        let collection = proxy_collection::<GitHubRepo>(
            Source::GitHub,
            "GitHub repos",
            Ok(serde_json::json!([{ "id": "seven" }])),
        );
        assert_eq!(collection.headers()[&ERROR_HEADER], "true");
    }
}
