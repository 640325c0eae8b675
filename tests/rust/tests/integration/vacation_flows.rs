//! Tool calls from MCP client to downstream API and back

use pretty_assertions::assert_eq;
use rmcp::model::ErrorCode;
use tests::{
    bearer_token, call_params, caller_payload, connect, derive_credential, init_test_tracing,
    result_text, TestGateway,
};
use vacation_gateway::{ApiOverrides, GatewayConfig};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mcp_error(err: rmcp::service::ServiceError) -> rmcp::ErrorData {
    match err {
        rmcp::service::ServiceError::McpError(e) => e,
        other => panic!("expected an MCP error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_tools_returns_catalog() {
    init_test_tracing();
    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let client = connect(&gateway.mcp_test_url(), None).await;

    let tools = client.list_tools(Default::default()).await.unwrap();
    let names: Vec<String> = tools.tools.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "get_my_vacations",
            "create_vacation_flow",
            "get_vacation_requirements",
            "advance_vacation_wflow"
        ]
    );

    client.cancel().await.ok();
    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_my_vacations_end_to_end() {
    init_test_tracing();
    let api = MockServer::start().await;
    let payload = caller_payload("vault-1", "user-42", &api.uri());
    let credential = derive_credential(&payload).unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/vacation/me"))
        .and(header("x-api-token", credential.expose()))
        .and(header("x-api-id", "user-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "plannedVacations": [
                { "days": 10, "startDate": "01-02-2025", "endDate": "10-02-2025", "status": "APPROVED" }
            ],
            "availablePeriods": [
                {
                    "availableDays": 20,
                    "acquisitivePeriodStart": "01-01-2024",
                    "acquisitivePeriodEnd": "31-12-2024",
                    "expirationDate": "31-12-2025"
                }
            ]
        })))
        .expect(1)
        .mount(&api)
        .await;

    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let client = connect(&gateway.mcp_url(), Some(&bearer_token(&payload))).await;

    let result = client
        .call_tool(call_params("get_my_vacations", serde_json::json!({})))
        .await
        .unwrap();
    let text = result_text(&result);

    assert!(text.starts_with("📅 **SUAS FÉRIAS**"));
    assert!(text.contains("1. **10 dias** - 01-02-2025 a 10-02-2025 (Status: APPROVED)"));
    assert!(text.contains("1. **20 dias disponíveis**"));
    assert!(text.contains("   • Período aquisitivo: 01-01-2024 a 31-12-2024"));
    assert!(text.contains("   • Vencimento: 31-12-2025"));

    client.cancel().await.ok();
    gateway.stop().await;
    api.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_flow_with_bad_date_makes_no_downstream_call() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&api)
        .await;

    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let token = bearer_token(&caller_payload("vault-1", "user-42", &api.uri()));
    let client = connect(&gateway.mcp_url(), Some(&token)).await;

    let err = client
        .call_tool(call_params(
            "create_vacation_flow",
            serde_json::json!({ "diasParaGozo": 10, "inicioFerias": "2025-01-10" }),
        ))
        .await
        .unwrap_err();
    assert_eq!(mcp_error(err).code, ErrorCode::INVALID_PARAMS);

    let err = client
        .call_tool(call_params(
            "create_vacation_flow",
            serde_json::json!({ "inicioFerias": "10-01-2025" }),
        ))
        .await
        .unwrap_err();
    assert_eq!(mcp_error(err).code, ErrorCode::INVALID_PARAMS);

    client.cancel().await.ok();
    gateway.stop().await;
    api.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_flow_then_requirements_then_advance() {
    let api = MockServer::start().await;
    let payload = caller_payload("vault-1", "user-42", &api.uri());

    Mock::given(method("POST"))
        .and(path("/rest/vacation"))
        .and(body_json(serde_json::json!({ "diasParaGozo": 15, "inicioFerias": "10-01-2025" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "message": "Fluxo criado",
            "fluxoId": "flow-9",
            "step": "ABONO",
            "data": { "diasParaGozo": 15, "inicioFerias": "10-01-2025" }
        })))
        .expect(1)
        .mount(&api)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/vacation/requirements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "step": "ABONO",
            "requirements": [{ "nome": "abono", "tipo": "boolean", "formato": "true|false" }]
        })))
        .expect(1)
        .mount(&api)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/vacation/next"))
        .and(body_json(serde_json::json!({ "abono": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "hasNext": false,
            "currentStep": "CONCLUIDO",
            "message": "Fluxo concluído",
            "data": { "abono": false, "createdAt": "2025-01-01", "updatedAt": "2025-01-02" }
        })))
        .expect(1)
        .mount(&api)
        .await;

    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let client = connect(&gateway.mcp_url(), Some(&bearer_token(&payload))).await;

    let created = result_text(
        &client
            .call_tool(call_params(
                "create_vacation_flow",
                serde_json::json!({ "diasParaGozo": 15, "inicioFerias": "10-01-2025" }),
            ))
            .await
            .unwrap(),
    );
    assert!(created.contains("• ID do Fluxo: flow-9"));
    assert!(created.contains("• Etapa Atual: ABONO"));

    let requirements = result_text(
        &client
            .call_tool(call_params("get_vacation_requirements", serde_json::json!({})))
            .await
            .unwrap(),
    );
    assert!(requirements.contains("🎯 Etapa: ABONO"));
    assert!(
        requirements.contains("1. **abono**\n   • Tipo: boolean\n   • Formato: true|false")
    );

    let advanced = result_text(
        &client
            .call_tool(call_params(
                "advance_vacation_wflow",
                serde_json::json!({ "data": { "abono": false } }),
            ))
            .await
            .unwrap(),
    );
    assert!(advanced.contains("• Tem Próxima Etapa: Não"));
    assert!(advanced.contains("• abono: false"));
    assert!(!advanced.contains("createdAt"));
    assert!(advanced.ends_with("🏁 Fluxo finalizado com sucesso!"));

    client.cancel().await.ok();
    gateway.stop().await;
    api.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_tool_is_invalid_params() {
    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let client = connect(&gateway.mcp_test_url(), None).await;

    let err = client
        .call_tool(call_params("delete_all_vacations", serde_json::json!({})))
        .await
        .unwrap_err();
    let err = mcp_error(err);
    assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    assert!(err.message.contains("delete_all_vacations"));

    client.cancel().await.ok();
    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_downstream_failure_is_generic_internal_error() {
    let api = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/vacation/me"))
        .respond_with(ResponseTemplate::new(500).set_body_string("stack trace with secrets"))
        .expect(1)
        .mount(&api)
        .await;

    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let token = bearer_token(&caller_payload("vault-1", "user-42", &api.uri()));
    let client = connect(&gateway.mcp_url(), Some(&token)).await;

    let err = client
        .call_tool(call_params("get_my_vacations", serde_json::json!({})))
        .await
        .unwrap_err();
    let err = mcp_error(err);
    assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
    assert_eq!(err.message, "Tool call failed");

    client.cancel().await.ok();
    gateway.stop().await;
    api.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unauthenticated_endpoint_uses_configured_fallbacks() {
    let api = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/vacation/requirements"))
        .and(header("x-api-token", "env-secret"))
        .and(header("x-api-id", "env-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "step": "BANCO",
            "requirements": []
        })))
        .expect(1)
        .mount(&api)
        .await;

    let gateway = TestGateway::start(GatewayConfig {
        api: ApiOverrides {
            base_url: Some(api.uri()),
            user_secret: Some("env-secret".to_string()),
            user_id: Some("env-user".to_string()),
        },
        ..GatewayConfig::default()
    })
    .await;
    let client = connect(&gateway.mcp_test_url(), None).await;

    let text = result_text(
        &client
            .call_tool(call_params("get_vacation_requirements", serde_json::json!({})))
            .await
            .unwrap(),
    );
    assert!(text.contains("🎯 Etapa: BANCO"));

    client.cancel().await.ok();
    gateway.stop().await;
    api.verify().await;
}
