use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use super::{
    source::SuggestionSource,
    types::{SuggestError, Suggestion, SuggestionsResponse},
};

/// Client for the suggestion search endpoint of the time-tracking server.
pub struct RemoteSuggestionSource {
    remote_addr: String,
    basic_auth: Option<(String, Option<String>)>,
    limit: usize,
    client: reqwest::Client,
}

impl RemoteSuggestionSource {
    pub fn new(
        addr: &str,
        basic_auth: Option<(String, Option<String>)>,
        limit: usize,
        timeout: Duration,
    ) -> Result<RemoteSuggestionSource, SuggestError> {
        let remote_addr = addr.strip_suffix("/").unwrap_or(addr).to_string();

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SuggestError::Network(err.to_string()))?;

        Ok(RemoteSuggestionSource {
            remote_addr,
            basic_auth,
            limit,
            client,
        })
    }

    fn search_url(&self, query: &str) -> Result<Url, SuggestError> {
        let mut url = Url::parse(&format!("{}/api/suggestions", self.remote_addr))
            .map_err(|err| SuggestError::Network(format!("invalid address: {err}")))?;

        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &self.limit.to_string());

        Ok(url)
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        log::debug!("GET {url}");

        match self.basic_auth.clone() {
            Some((username, password)) => self.client.get(url).basic_auth(username, password),
            None => self.client.get(url),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum WebResponse<T> {
    Error { error: String },
    Data(T),
}

/// Decode a response body, turning the server's `{"error": ...}` shape into
/// [`SuggestError::Server`].
pub fn decode_body<T>(text: &str) -> Result<T, SuggestError>
where
    T: DeserializeOwned,
{
    let web_response = serde_json::from_str::<WebResponse<T>>(text).map_err(|err| {
        log::error!("{err}. tried to parse: {text:?}");
        SuggestError::Malformed(err.to_string())
    })?;

    match web_response {
        WebResponse::Data(data) => Ok(data),
        WebResponse::Error { error } => Err(SuggestError::Server(error)),
    }
}

async fn handle_response<T>(response: reqwest::Response) -> Result<T, SuggestError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| SuggestError::Network(err.to_string()))?;

    if !status.is_success() {
        // prefer the server's own message when it sent one
        return match decode_body::<serde_json::Value>(&text) {
            Err(SuggestError::Server(message)) => Err(SuggestError::Server(message)),
            _ => Err(SuggestError::Status(status.as_u16())),
        };
    }

    decode_body(&text)
}

#[async_trait]
impl SuggestionSource for RemoteSuggestionSource {
    async fn search(&self, query: &str) -> Result<Vec<Suggestion>, SuggestError> {
        let url = self.search_url(query)?;

        let response = self
            .get(url)
            .send()
            .await
            .map_err(|err| SuggestError::Network(err.to_string()))?;

        let body = handle_response::<SuggestionsResponse>(response).await?;

        Ok(body.suggestions)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::suggestions::SuggestionKind;

    #[test]
    fn test_decode_suggestions() {
        let body = r#"{
            "suggestions": [
                {"id": "1", "text": "Write report", "type": "activity", "frequency": 12, "extra": true},
                {"id": "2", "text": "work", "type": "tag", "frequency": 3, "lastUsed": "2024-05-01T10:00:00Z"}
            ]
        }"#;

        let response = decode_body::<SuggestionsResponse>(body).unwrap();
        assert_eq!(response.suggestions.len(), 2);
        assert_eq!(response.suggestions[0].kind, SuggestionKind::Activity);
        assert_eq!(response.suggestions[0].frequency, 12);
        assert!(response.suggestions[0].last_used.is_none());
        assert_eq!(response.suggestions[1].kind, SuggestionKind::Tag);
        assert!(response.suggestions[1].last_used.is_some());
    }

    #[test]
    fn test_decode_missing_field_is_malformed() {
        let body = r#"{"suggestions": [{"id": "1", "type": "tag", "frequency": 1}]}"#;
        let err = decode_body::<SuggestionsResponse>(body).unwrap_err();
        assert!(matches!(err, SuggestError::Malformed(_)));
    }

    #[test]
    fn test_decode_unknown_type_is_malformed() {
        let body = r#"{"suggestions": [{"id": "1", "text": "x", "type": "goal", "frequency": 1}]}"#;
        assert!(matches!(
            decode_body::<SuggestionsResponse>(body),
            Err(SuggestError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_server_error() {
        let body = r#"{"error": "rate limited"}"#;
        assert_eq!(
            decode_body::<SuggestionsResponse>(body).unwrap_err(),
            SuggestError::Server("rate limited".to_string())
        );
    }

    #[test]
    fn test_decode_garbage_is_malformed() {
        assert!(matches!(
            decode_body::<SuggestionsResponse>("<html>"),
            Err(SuggestError::Malformed(_))
        ));
    }

    #[test]
    fn test_search_url() {
        let source = RemoteSuggestionSource::new(
            "http://localhost:8080/",
            None,
            5,
            Duration::from_secs(1),
        )
        .unwrap();

        let url = source.search_url("deep work #fo").unwrap();
        assert_eq!(url.path(), "/api/suggestions");
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "deep work #fo".to_string()),
                ("limit".to_string(), "5".to_string())
            ]
        );
    }

    #[test]
    fn test_search_url_empty_query() {
        let source =
            RemoteSuggestionSource::new("http://localhost:8080", None, 10, Duration::from_secs(1))
                .unwrap();
        let url = source.search_url("").unwrap();
        assert_eq!(url.query(), Some("q=&limit=10"));
    }
}
