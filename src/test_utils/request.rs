use axum::{
    body::Body,
    extract::{FromRequest, FromRequestParts},
    http::{Request, header::CONTENT_TYPE},
};
use axum_extra::extract::{Form, Query};
use serde::de::DeserializeOwned;

/// Decodes a URL encoded request body with the extractor the handlers use.
pub(crate) async fn extract_form<T: DeserializeOwned>(body: &str) -> Result<T, String> {
    let request = Request::post("/")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap();

    Form::<T>::from_request(request, &())
        .await
        .map(|Form(form)| form)
        .map_err(|rejection| rejection.to_string())
}

/// Decodes a query string, without the leading `?`, with the extractor the
/// page handlers use.
pub(crate) async fn extract_query<T: DeserializeOwned>(query: &str) -> Result<T, String> {
    let (mut parts, _) = Request::get(format!("/?{query}"))
        .body(())
        .unwrap()
        .into_parts();

    Query::<T>::from_request_parts(&mut parts, &())
        .await
        .map(|Query(query)| query)
        .map_err(|rejection| rejection.to_string())
}
