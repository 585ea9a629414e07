use chrono::NaiveDate;
use finbalance_core::{GatewaySettings, ParsedType, Profile};
use finbalance_finance::{
    EvolutionGateway, LogQuery, RecordStore, SqliteStore, WebhookOrchestrator, WebhookOutcome,
    WebhookSettings,
};
use finbalance_ingest::WebhookPayload;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PHONE: &str = "5511987654321";

fn message(text: &str) -> WebhookPayload {
    serde_json::from_value(json!({
        "instance": "finbalance",
        "data": {
            "key": { "remoteJid": format!("{PHONE}@s.whatsapp.net") },
            "message": { "extendedTextMessage": { "text": text } }
        }
    }))
    .unwrap()
}

/// A month of chat traffic through SQLite and a mocked Evolution API.
#[tokio::test]
async fn test_month_of_messages_against_sqlite() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/message/sendText/finbalance"))
        .and(header("apikey", "user-key"))
        .respond_with(ResponseTemplate::new(201))
        .expect(5)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(&dir.path().join("fb.db")).unwrap());
    store
        .upsert_profile(Profile {
            user_id: "u-1".to_string(),
            phone_number: Some(PHONE.to_string()),
            full_name: Some("Ana".to_string()),
        })
        .unwrap();
    store
        .upsert_gateway_settings(GatewaySettings {
            user_id: "u-1".to_string(),
            api_url: Some(server.uri()),
            api_key: Some("user-key".to_string()),
            instance_name: None,
        })
        .unwrap();

    let orch = WebhookOrchestrator::new(
        store.clone(),
        Arc::new(EvolutionGateway::new(reqwest::Client::new())),
        WebhookSettings::default(),
    )
    .unwrap();

    let oct = |d| NaiveDate::from_ymd_opt(2025, 10, d).unwrap();
    orch.handle(&message("recebi 1000 de salário"), oct(1)).await;
    orch.handle(&message("gastei 300 no mercado"), oct(3)).await;
    orch.handle(&message("paguei 200 no cartão de crédito"), oct(10)).await;
    // September record stays out of the October report
    orch.handle(&message("gastei 999 no bar"), NaiveDate::from_ymd_opt(2025, 9, 30).unwrap())
        .await;

    let outcome = orch.handle(&message("qual minha fatura do cartão?"), oct(20)).await;
    let WebhookOutcome::Processed { parsed, reply } = outcome else {
        panic!("expected processed outcome");
    };
    assert_eq!(parsed.parsed_type(), Some(ParsedType::Pergunta));
    assert_eq!(
        reply.as_deref(),
        Some("💳 *Fatura do Cartão (outubro)*\n\nTotal: R$ 200.00\n\nLembre-se de pagar em dia! 📅")
    );

    let logs = store
        .message_logs(&LogQuery { limit: 10, ..Default::default() })
        .unwrap();
    assert_eq!(logs.len(), 5);
    assert!(logs.iter().all(|l| l.response_sent.is_some()));
    assert_eq!(
        store
            .message_logs(&LogQuery {
                parsed_type: Some(Some(ParsedType::Gasto)),
                limit: 10,
                ..Default::default()
            })
            .unwrap()
            .len(),
        3
    );
}
