use std::sync::Arc;

use tracing::{debug, warn};

use super::errors::FetchError;
use super::normalize::normalize;
use super::transport::HttpTransport;
use super::types::{NormalizedPayload, SourceKind};
use crate::credential::CredentialGate;
use crate::errors::ArbiwatchError;

/// Performs one named remote read and normalizes the payload.
///
/// Failures stay inside the fetcher: every outcome is returned as a
/// `Result`, so one source failing cannot abort its siblings.
#[derive(Clone)]
pub struct SourceFetcher {
    kind: SourceKind,
    transport: Arc<dyn HttpTransport>,
    gate: CredentialGate,
}

impl SourceFetcher {
    pub fn new(kind: SourceKind, transport: Arc<dyn HttpTransport>, gate: CredentialGate) -> Self {
        Self {
            kind,
            transport,
            gate,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Read the credential now and fetch with it.
    pub async fn fetch(&self) -> Result<NormalizedPayload, FetchError> {
        self.fetch_with(self.gate.bearer().as_deref()).await
    }

    /// Fetch with a bearer resolved by the caller.
    ///
    /// Public sources ignore `bearer`. Authenticated sources without one
    /// fail before any network call.
    pub async fn fetch_with(&self, bearer: Option<&str>) -> Result<NormalizedPayload, FetchError> {
        let source = self.kind.name();

        let bearer = if self.kind.requires_auth() {
            match bearer {
                Some(token) => Some(token),
                None => {
                    debug!(event = "core.fetch.skipped_unauthorized", source = source);
                    return Err(FetchError::Unauthorized {
                        source_name: source,
                    });
                }
            }
        } else {
            None
        };

        debug!(event = "core.fetch.started", source = source);

        let result = match self.transport.get_json(self.kind.path(), bearer).await {
            Ok(raw) => normalize(self.kind, raw),
            Err(e) => Err(e),
        };

        match &result {
            Ok(payload) => debug!(
                event = "core.fetch.completed",
                source = source,
                records = payload.len()
            ),
            Err(e) => warn!(
                event = "core.fetch.failed",
                source = source,
                error_code = e.error_code(),
                error = %e
            ),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::SharedCredential;
    use crate::sources::types::Price;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;

    fn fetcher(
        kind: SourceKind,
        transport: &Arc<ScriptedTransport>,
        credential: &SharedCredential,
    ) -> SourceFetcher {
        SourceFetcher::new(
            kind,
            transport.clone(),
            CredentialGate::new(Arc::new(credential.clone())),
        )
    }

    #[tokio::test]
    async fn test_unauthorized_makes_no_network_call() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(SourceKind::Pairs.path(), Ok(json!([])));
        let credential = SharedCredential::new();

        let err = fetcher(SourceKind::Pairs, &transport, &credential)
            .fetch()
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FetchError::Unauthorized {
                source_name: "pairs"
            }
        );
        assert_eq!(transport.calls(SourceKind::Pairs.path()), 0);
    }

    #[tokio::test]
    async fn test_bearer_attached_for_authenticated_source() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(SourceKind::Tracking.path(), Ok(json!({})));
        let credential = SharedCredential::with_token("tok");

        fetcher(SourceKind::Tracking, &transport, &credential)
            .fetch()
            .await
            .unwrap();

        assert_eq!(
            transport.bearers(SourceKind::Tracking.path()),
            vec![Some("tok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_public_source_bypasses_gate() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            SourceKind::Sentiment.path(),
            Ok(json!({"success": true, "data": [{"symbol": "BTC"}]})),
        );
        let credential = SharedCredential::with_token("tok");

        let payload = fetcher(SourceKind::Sentiment, &transport, &credential)
            .fetch()
            .await
            .unwrap();

        assert_eq!(payload.len(), 1);
        assert_eq!(transport.bearers(SourceKind::Sentiment.path()), vec![None]);
    }

    #[tokio::test]
    async fn test_http_status_is_returned_not_raised() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            SourceKind::Pairs.path(),
            Err(FetchError::HttpStatus { status: 500 }),
        );
        let credential = SharedCredential::with_token("tok");

        let result = fetcher(SourceKind::Pairs, &transport, &credential).fetch().await;
        assert_eq!(result, Err(FetchError::HttpStatus { status: 500 }));
    }

    #[tokio::test]
    async fn test_tracking_payload_normalized() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            SourceKind::Tracking.path(),
            Ok(json!({
                "BTC": {
                    "lowestExchange": "A",
                    "lowestPrice": 100,
                    "highestExchange": "B",
                    "highestPrice": 110,
                    "profitPercentage": 9.1
                }
            })),
        );
        let credential = SharedCredential::with_token("tok");

        let payload = fetcher(SourceKind::Tracking, &transport, &credential)
            .fetch()
            .await
            .unwrap();

        let NormalizedPayload::Tracking(records) = payload else {
            panic!("expected tracking payload");
        };
        assert_eq!(records[0].coin1, "BTC");
        assert_eq!(records[0].min_price1, Price::Quoted(100.0));
        assert_eq!(records[0].max_exchange, "B");
    }
}
