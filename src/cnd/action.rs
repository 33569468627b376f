//! Turning a Siren action into an HTTP request

use crate::error::{OrchestratorError, OrchestratorResult, WalletError};
use crate::ledger::LedgerAction;
use crate::siren::{Action, FieldValueResolver};

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Request, StatusCode, Url};
use std::collections::BTreeMap;
use tracing::debug;

/// Body encodings the swap node may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Query,
    Json,
    Form,
}

/// What the swap node answered to an executed action
#[derive(Debug, Clone)]
pub struct ActionResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ActionResponse {
    /// Ledger instruction carried by the response, if any
    pub fn ledger_action(&self) -> OrchestratorResult<Option<LedgerAction>> {
        LedgerAction::from_response_body(&self.body)
    }
}

/// Resolve every field of `action` to a value, dropping fields without one
pub async fn resolve_fields(
    action: &Action,
    resolver: &dyn FieldValueResolver,
) -> OrchestratorResult<Vec<(String, String)>> {
    let mut values = Vec::with_capacity(action.fields.len());

    for field in &action.fields {
        match resolver.resolve(field).await {
            Ok(Some(value)) => values.push((field.name.clone(), value)),
            Ok(None) => debug!("Field '{}' of '{}' left empty", field.name, action.name),
            Err(e) => {
                let params = serde_json::to_value(field).unwrap_or_default();
                return Err(WalletError::new(action.name.clone(), e, params).into());
            }
        }
    }

    Ok(values)
}

fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

fn encoding(action: &Action) -> OrchestratorResult<Encoding> {
    if action.is_query() {
        return Ok(Encoding::Query);
    }

    match action.media_type.as_deref() {
        None => Ok(Encoding::Form),
        Some(media_type) if is_json_media_type(media_type) => Ok(Encoding::Json),
        Some(media_type)
            if media_type
                .trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded") =>
        {
            Ok(Encoding::Form)
        }
        Some(other) => Err(OrchestratorError::ProtocolViolation(format!(
            "action '{}' asks for unsupported body encoding '{}'",
            action.name, other
        ))),
    }
}

fn method(action: &Action) -> OrchestratorResult<Method> {
    match action.method.as_deref() {
        None => Ok(Method::GET),
        Some(method) => Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| {
                OrchestratorError::ProtocolViolation(format!(
                    "action '{}' has invalid method '{}'",
                    action.name, method
                ))
            }),
    }
}

/// Build the request executing `action` at `url` with the resolved `values`.
///
/// Query actions carry the values in the URL. Everything else sends them as a
/// body in the encoding the action declares.
pub fn build_action_request(
    client: &Client,
    mut url: Url,
    action: &Action,
    values: &[(String, String)],
) -> OrchestratorResult<Request> {
    let method = method(action)?;

    let request = match encoding(action)? {
        Encoding::Query => {
            if !values.is_empty() {
                url.query_pairs_mut().extend_pairs(values);
            }
            client.request(method, url).build()?
        }
        Encoding::Form => client.request(method, url).form(values).build()?,
        Encoding::Json => {
            let map: BTreeMap<&str, &str> = values
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            let canonical = serde_json::to_vec(&map)?;

            let request = client
                .request(method, url)
                .header(CONTENT_TYPE, action.media_type.as_deref().unwrap_or("application/json"))
                .body(canonical.clone())
                .build()?;

            let sent = request.body().and_then(|body| body.as_bytes());
            if sent != Some(canonical.as_slice()) {
                return Err(OrchestratorError::ProtocolViolation(format!(
                    "body of action '{}' does not match its JSON encoding",
                    action.name
                )));
            }
            request
        }
    };

    debug!("Built {} {} for action '{}'", request.method(), request.url(), action.name);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::siren::Field;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    struct FixedValues(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl FieldValueResolver for FixedValues {
        async fn resolve(&self, field: &Field) -> anyhow::Result<Option<String>> {
            Ok(self.0.get(field.name.as_str()).map(|v| v.to_string()))
        }
    }

    struct Broken;

    #[async_trait]
    impl FieldValueResolver for Broken {
        async fn resolve(&self, _field: &Field) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("wallet is locked"))
        }
    }

    fn action(value: serde_json::Value) -> Action {
        serde_json::from_value(value).unwrap()
    }

    fn redeem_action(method: &str, media_type: Option<&str>) -> Action {
        let mut value = json!({
            "name": "redeem",
            "href": "/swaps/abc/redeem",
            "method": method,
            "fields": [
                { "name": "address", "class": ["bitcoin", "address"] },
                { "name": "fee_per_wu", "class": ["bitcoin", "feePerWU"] },
                { "name": "note", "class": ["text"] }
            ]
        });
        if let Some(media_type) = media_type {
            value["type"] = json!(media_type);
        }
        action(value)
    }

    fn resolver() -> FixedValues {
        FixedValues(HashMap::from([
            ("address", "bcrt1q 6rh&x=y"),
            ("fee_per_wu", "150"),
        ]))
    }

    fn url() -> Url {
        Url::parse("http://127.0.0.1:8000/swaps/abc/redeem").unwrap()
    }

    #[tokio::test]
    async fn unresolved_fields_are_omitted() {
        let action = redeem_action("GET", None);
        let values = resolve_fields(&action, &resolver()).await.unwrap();

        assert_eq!(
            values,
            vec![
                ("address".to_string(), "bcrt1q 6rh&x=y".to_string()),
                ("fee_per_wu".to_string(), "150".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn resolver_failure_names_the_action() {
        let action = redeem_action("GET", None);
        let error = resolve_fields(&action, &Broken).await.unwrap_err();

        assert_eq!(error.to_string(), "wallet is locked");
        match error {
            OrchestratorError::Wallet(wallet_error) => {
                assert_eq!(wallet_error.attempted_action, "redeem");
                assert_eq!(wallet_error.call_params["name"], "address");
            }
            other => panic!("expected wallet error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn query_values_round_trip_through_the_url() {
        let action = redeem_action("GET", None);
        let values = resolve_fields(&action, &resolver()).await.unwrap();

        let request = build_action_request(&Client::new(), url(), &action, &values).unwrap();

        assert_eq!(request.method(), Method::GET);
        assert!(request.body().is_none());
        let decoded: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        assert_eq!(decoded, values);
    }

    #[test]
    fn query_without_values_keeps_the_url_clean() {
        let action = action(json!({ "name": "fund", "href": "/swaps/abc/fund" }));
        let request = build_action_request(&Client::new(), url(), &action, &[]).unwrap();

        assert_eq!(request.url().as_str(), "http://127.0.0.1:8000/swaps/abc/redeem");
    }

    #[tokio::test]
    async fn json_body_is_the_canonical_encoding() {
        let action = redeem_action("POST", Some("application/json"));
        let values = resolve_fields(&action, &resolver()).await.unwrap();

        let request = build_action_request(&Client::new(), url(), &action, &values).unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(body).unwrap(),
            json!({ "address": "bcrt1q 6rh&x=y", "fee_per_wu": "150" })
        );
    }

    #[test]
    fn vendor_json_types_are_json() {
        assert!(is_json_media_type("application/vnd.comit+json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(!is_json_media_type("text/plain"));
    }

    #[tokio::test]
    async fn missing_type_sends_a_form() {
        let action = redeem_action("POST", None);
        let values = resolve_fields(&action, &resolver()).await.unwrap();

        let request = build_action_request(&Client::new(), url(), &action, &values).unwrap();

        assert_eq!(
            request.headers()[CONTENT_TYPE],
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"address=bcrt1q+6rh%26x%3Dy&fee_per_wu=150");
    }

    #[test]
    fn unsupported_body_type_is_a_protocol_violation() {
        let action = redeem_action("POST", Some("text/plain"));
        let error = build_action_request(&Client::new(), url(), &action, &[]).unwrap_err();

        assert!(matches!(error, OrchestratorError::ProtocolViolation(_)));
        assert!(error.to_string().contains("text/plain"));
    }

    #[test]
    fn response_without_instruction_has_no_ledger_action() {
        let response = ActionResponse {
            status: StatusCode::OK,
            body: br#"{"type":"none"}"#.to_vec(),
        };
        assert_eq!(response.ledger_action().unwrap(), None);
    }
}
