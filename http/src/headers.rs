//! Protocol header names and the request-intent parser.
//!
//! Parsing is total: missing, empty, non-UTF-8 or unrecognized values fall back
//! to the neutral default, which amounts to "full visit, nothing cached".

use http::HeaderMap;
use http::header::HeaderName;
use kinetic_core::{MergeDirection, RequestIntent};

/// Marks a request or response as part of the protocol.
pub const X_INERTIA: HeaderName = HeaderName::from_static("x-inertia");
pub const X_INERTIA_VERSION: HeaderName = HeaderName::from_static("x-inertia-version");
pub const X_INERTIA_PARTIAL_COMPONENT: HeaderName =
    HeaderName::from_static("x-inertia-partial-component");
pub const X_INERTIA_PARTIAL_DATA: HeaderName = HeaderName::from_static("x-inertia-partial-data");
pub const X_INERTIA_PARTIAL_EXCEPT: HeaderName =
    HeaderName::from_static("x-inertia-partial-except");
pub const X_INERTIA_RESET: HeaderName = HeaderName::from_static("x-inertia-reset");
pub const X_INERTIA_ERROR_BAG: HeaderName = HeaderName::from_static("x-inertia-error-bag");
pub const X_INERTIA_EXCEPT_ONCE_PROPS: HeaderName =
    HeaderName::from_static("x-inertia-except-once-props");
pub const X_INERTIA_INFINITE_SCROLL_MERGE_INTENT: HeaderName =
    HeaderName::from_static("x-inertia-infinite-scroll-merge-intent");
/// Authoritative URL for a client-side hard navigation.
pub const X_INERTIA_LOCATION: HeaderName = HeaderName::from_static("x-inertia-location");
pub const PURPOSE: HeaderName = HeaderName::from_static("purpose");

/// Normalizes the protocol headers of a request.
pub fn parse_intent(headers: &HeaderMap) -> RequestIntent {
    RequestIntent {
        is_protocol_request: single(headers, &X_INERTIA)
            .is_some_and(|v| v.eq_ignore_ascii_case("true")),
        client_version: single(headers, &X_INERTIA_VERSION).map(str::to_string),
        partial_component: single(headers, &X_INERTIA_PARTIAL_COMPONENT).map(str::to_string),
        partial_include: list(headers, &X_INERTIA_PARTIAL_DATA),
        partial_exclude: list(headers, &X_INERTIA_PARTIAL_EXCEPT),
        reset_props: list(headers, &X_INERTIA_RESET),
        error_bag: single(headers, &X_INERTIA_ERROR_BAG).map(str::to_string),
        except_once_props: list(headers, &X_INERTIA_EXCEPT_ONCE_PROPS),
        scroll_merge_direction: single(headers, &X_INERTIA_INFINITE_SCROLL_MERGE_INTENT)
            .and_then(merge_direction),
        is_prefetch: headers
            .get(&PURPOSE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "prefetch"),
    }
}

/// Splits a comma-separated header value; `""` yields an empty list.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn single<'h>(headers: &'h HeaderMap, name: &HeaderName) -> Option<&'h str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn list(headers: &HeaderMap, name: &HeaderName) -> Vec<String> {
    single(headers, name).map(split_list).unwrap_or_default()
}

fn merge_direction(value: &str) -> Option<MergeDirection> {
    match value {
        "append" => Some(MergeDirection::Append),
        "prepend" => Some(MergeDirection::Prepend),
        _ => None,
    }
}
