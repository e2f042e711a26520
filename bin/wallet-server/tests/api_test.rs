//! integration tests for multisig-wallet-server

use core::time::Duration;

use std::sync::Arc;

use alloy_primitives::{Address, U256, address};
use axum::{
    Router,
    body::{self, Body},
    http::{Method, Request, StatusCode, header},
};
use chrono::{NaiveDate, NaiveDateTime};
use multisig_wallet_domain::dashboard::{Approvals, TxRecord, TxStatus, WalletSnapshot};
use multisig_wallet_engine::{ConnectionError, DispatchEngine, NAVIGATION_DELAY, Started};
use multisig_wallet_server::{App, SessionStore, create_router};
use multisig_wallet_test_utils::{ALICE, BOB, CAROL, MockConnection, address_text};
use serde_json::{Value, json};
use tower::ServiceExt;

const FACTORY: Address = address!("0xfafafafafafafafafafafafafafafafafafafafa");
const COUNTER: Address = address!("0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0");

struct TestServer {
    router: Router,
    engine: Arc<DispatchEngine<MockConnection, Started>>,
}

impl TestServer {
    fn new(connection: MockConnection) -> Self {
        Self::with_sessions(connection, SessionStore::default())
    }

    fn with_sessions(connection: MockConnection, sessions: SessionStore) -> Self {
        let engine = Arc::new(DispatchEngine::new(connection).start_connection_runtime());

        let app = App::builder()
            .engine(Arc::clone(&engine))
            .sessions(sessions)
            .factory_address(FACTORY)
            .counter_address(COUNTER)
            .build();

        Self { router: create_router(app), engine }
    }

    fn connection(&self) -> &MockConnection {
        self.engine.connection()
    }

    async fn post(&self, uri: &str, payload: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn create_session(&self) -> String {
        let (status, body) = self.post("/api/v1/session/create", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        body["session"]["id"].as_str().unwrap().to_owned()
    }

    async fn act(&self, session_id: &str, action: &str) -> (StatusCode, Value) {
        self.post("/api/v1/session/action", json!({ "session_id": session_id, "action": action }))
            .await
    }

    async fn session(&self, session_id: &str) -> Value {
        let (status, body) =
            self.post("/api/v1/session/details", json!({ "session_id": session_id })).await;
        assert_eq!(status, StatusCode::OK);
        body["session"].clone()
    }

    /// Creates a session on the create wallet screen with a valid `2 / 2 / 3` Treasury form.
    async fn session_with_valid_form(&self) -> String {
        let session_id = self.create_session().await;
        self.act(&session_id, "get_started").await;
        self.act(&session_id, "create_new_wallet").await;

        let owners = json!([address_text(&ALICE), address_text(&BOB), address_text(&CAROL)]);
        let (status, _) = self
            .post(
                "/api/v1/session/owners/add",
                json!({ "session_id": session_id, "input": owners.to_string() }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .post(
                "/api/v1/session/form/update",
                json!({
                    "session_id": session_id,
                    "name": "Treasury",
                    "minimum_threshold": 2,
                    "initial_approvals": 2,
                    "initial_votes": 3,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["form"]["errors"], json!([]));

        session_id
    }

    async fn wait_for_dispatch(&self, dispatch_id: &str, status: &str) -> Value {
        for _ in 0..100 {
            let (code, body) =
                self.post("/api/v1/dispatch/status", json!({ "dispatch_id": dispatch_id })).await;
            assert_eq!(code, StatusCode::OK);

            if body["dispatch"]["status"] == status {
                return body["dispatch"].clone();
            }

            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        panic!("dispatch {dispatch_id} never reached {status}");
    }
}

fn lowercase(value: &Value) -> String {
    value.as_str().unwrap().to_lowercase()
}

fn record(at: &str, kind: &str, amount: &str, status: TxStatus) -> TxRecord {
    TxRecord::builder()
        .at(NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap())
        .kind(kind)
        .maybe_approvals((status == TxStatus::Pending).then_some(Approvals { collected: 1, required: 2 }))
        .amount(amount)
        .status(status)
        .build()
}

fn treasury_snapshot(address: Address) -> WalletSnapshot {
    WalletSnapshot::builder()
        .address(address)
        .name("Treasury")
        .balance(U256::from(1_500_000_000_000_000_000u128))
        .owners(vec![ALICE, BOB])
        .minimum_approvals(2)
        .created_on(NaiveDate::from_ymd_opt(2023, 4, 15).unwrap())
        .transactions(vec![
            record("2023-04-15 12:33", "Deposit", "+1.23 BTC", TxStatus::Executed),
            record("2023-04-12 03:31", "Transfer", "-0.50 ETH", TxStatus::Pending),
            record("2023-04-10 09:15", "Withdrawal", "-0.56 ETH", TxStatus::Pending),
        ])
        .build()
}

#[tokio::test]
async fn health_check() {
    let server = TestServer::new(MockConnection::new());

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn route_resolution() {
    let server = TestServer::new(MockConnection::new());

    let (status, body) =
        server.post("/api/v1/route/resolve", json!({ "path": format!("/{}", address_text(&BOB)) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "dashboard");
    assert_eq!(lowercase(&body["wallet_address"]), address_text(&BOB));

    for path in [json!(null), json!("/"), json!("/0x1234"), json!("/settings")] {
        let (_, body) = server.post("/api/v1/route/resolve", json!({ "path": path })).await;
        assert_eq!(body["view"], "onboarding", "path {path}");
        assert!(body["wallet_address"].is_null());
    }
}

#[tokio::test]
async fn wallet_validation_reports_field_errors() {
    let server = TestServer::new(MockConnection::new());

    // duplicate inside a batch
    let owners = json!([address_text(&ALICE), address_text(&ALICE)]).to_string();
    let (status, body) = server
        .post(
            "/api/v1/wallet/validate",
            json!({
                "owners": owners,
                "minimum_threshold": 1,
                "initial_approvals": 1,
                "initial_votes": 1,
                "name": "Treasury",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["errors"][0]["field"], "owners");
    assert!(body["errors"][0]["message"].as_str().unwrap().contains("duplicate owner address"));

    // threshold above the number of owners
    let (_, body) = server
        .post(
            "/api/v1/wallet/validate",
            json!({
                "owners": address_text(&ALICE),
                "minimum_threshold": 2,
                "initial_approvals": 2,
                "initial_votes": 2,
                "name": "T",
            }),
        )
        .await;
    assert_eq!(body["valid"], false);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.contains(&json!({
        "field": "minimum_threshold",
        "message": "minimum threshold cannot exceed number of owners",
    })));
    assert!(errors.iter().any(|error| error["field"] == "name"));

    // valid request
    let owners = json!([address_text(&ALICE), address_text(&BOB)]).to_string();
    let (_, body) = server
        .post(
            "/api/v1/wallet/validate",
            json!({
                "owners": owners,
                "minimum_threshold": 1,
                "initial_approvals": 2,
                "initial_votes": 1,
                "name": "Treasury",
            }),
        )
        .await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["errors"], json!([]));
    assert_eq!(
        body["request"]["function_signature"],
        "createMultiSigWalletAndHandler(address[],uint256,uint256,uint256,string)"
    );
    assert_eq!(body["request"]["owners"].as_array().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn wallet_creation_flow_navigates_to_the_created_wallet() {
    // Arrange
    let connection = MockConnection::new();
    let wallet = Address::repeat_byte(0x77);
    connection.deploy_next_wallet_at(wallet);

    let server = TestServer::new(connection);
    let session_id = server.session_with_valid_form().await;

    // Act
    let (status, body) = server.act(&session_id, "open_review").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["review"]["step"], "risk_warning");

    let (_, body) = server.act(&session_id, "acknowledge_risk").await;
    assert_eq!(body["session"]["review"]["step"], "summary");
    assert_eq!(body["session"]["review"]["request"]["name"], "Treasury");

    let (status, body) = server.act(&session_id, "confirm_deploy").await;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transition"], "deploy");
    assert_eq!(body["session"]["screen"], "deploying");
    assert_eq!(body["session"]["deploying"]["initial_votes"], 3);

    let dispatch_id = body["session"]["dispatch"]["id"].as_str().unwrap().to_owned();
    let dispatch = server.wait_for_dispatch(&dispatch_id, "confirmed").await;
    assert_eq!(dispatch["function_name"], "createMultiSigWalletAndHandler");
    assert_eq!(dispatch["progress"], 100);
    assert_eq!(dispatch["status_text"], "Wallet Created - Fetching Wallet ...");
    assert_eq!(dispatch["notification"]["level"], "success");
    assert_eq!(dispatch["notification"]["message"], "Transaction confirmed - Wallet created!");
    assert_eq!(lowercase(&dispatch["created_wallet"]), address_text(&wallet));

    let calls = server.connection().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target(), FACTORY);

    assert!(server.session(&session_id).await["opened_wallet"].is_null());

    tokio::time::sleep(NAVIGATION_DELAY + Duration::from_millis(100)).await;

    let session = server.session(&session_id).await;
    assert_eq!(lowercase(&session["opened_wallet"]), address_text(&wallet));
}

#[tokio::test]
async fn deploying_requires_a_reviewed_request() {
    let server = TestServer::new(MockConnection::new());
    let session_id = server.create_session().await;
    server.act(&session_id, "get_started").await;
    server.act(&session_id, "create_new_wallet").await;

    let (status, _) = server.act(&session_id, "confirm_deploy").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = server.act(&session_id, "open_review").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"].as_array().unwrap().iter().any(|error| error["field"] == "owners"));

    assert_eq!(server.session(&session_id).await["screen"], "create_wallet");
    assert!(server.connection().calls().is_empty());
}

#[tokio::test]
async fn unavailable_actions_are_rejected() {
    let server = TestServer::new(MockConnection::new());
    let session_id = server.create_session().await;

    let (status, body) = server.act(&session_id, "back").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "action `back` is not available on screen `welcome`");

    let (status, _) = server.act(&session_id, "teleport").await;
    assert!(status.is_client_error());

    assert_eq!(server.session(&session_id).await["screen"], "welcome");
}

#[tokio::test]
async fn owner_batches_are_atomic() {
    let server = TestServer::new(MockConnection::new());
    let session_id = server.create_session().await;
    server.act(&session_id, "get_started").await;
    server.act(&session_id, "create_new_wallet").await;

    let (status, body) = server
        .post(
            "/api/v1/session/owners/add",
            json!({ "session_id": session_id, "input": address_text(&ALICE) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["form"]["owners"].as_array().unwrap().len(), 1);

    let batch = json!([address_text(&BOB), address_text(&ALICE)]).to_string();
    let (status, body) = server
        .post("/api/v1/session/owners/add", json!({ "session_id": session_id, "input": batch }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("duplicate owner address"));

    let (status, _) = server
        .post("/api/v1/session/owners/add", json!({ "session_id": session_id, "input": "0xabc" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let session = server.session(&session_id).await;
    assert_eq!(session["form"]["owners"].as_array().unwrap().len(), 1);

    let (status, body) = server
        .post(
            "/api/v1/session/owners/remove",
            json!({ "session_id": session_id, "owner": address_text(&ALICE) }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["form"]["owners"], json!([]));
}

#[tokio::test]
async fn form_is_locked_during_review() {
    let server = TestServer::new(MockConnection::new());
    let session_id = server.session_with_valid_form().await;

    server.act(&session_id, "open_review").await;

    let (status, _) = server
        .post("/api/v1/session/form/update", json!({ "session_id": session_id, "name": "Other" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = server.act(&session_id, "cancel_review").await;
    assert!(body["session"]["review"].is_null());
    assert_eq!(body["session"]["form"]["name"], "Treasury");
}

#[tokio::test]
async fn negative_thresholds_are_reported_on_their_fields() {
    let server = TestServer::new(MockConnection::new());

    let owners = json!([address_text(&ALICE), address_text(&BOB)]).to_string();
    let (status, body) = server
        .post(
            "/api/v1/wallet/validate",
            json!({
                "owners": owners,
                "minimum_threshold": -1,
                "initial_approvals": 1,
                "initial_votes": 1,
                "name": "Treasury",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(
        body["errors"],
        json!([{ "field": "minimum_threshold", "message": "must be at least 1" }])
    );

    let session_id = server.session_with_valid_form().await;
    let (status, body) = server
        .post(
            "/api/v1/session/form/update",
            json!({ "session_id": session_id, "initial_votes": -3 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["form"]["initial_votes"], -3);
    assert_eq!(
        body["session"]["form"]["errors"],
        json!([{ "field": "initial_votes", "message": "must be at least 1" }])
    );

    let (status, _) = server.act(&session_id, "open_review").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn declined_signature_is_reported_verbatim() {
    let connection = MockConnection::new();
    connection.fail_next_send(ConnectionError::rejected("User rejected the request."));

    let server = TestServer::new(connection);
    let session_id = server.session_with_valid_form().await;
    server.act(&session_id, "open_review").await;
    server.act(&session_id, "acknowledge_risk").await;
    let (_, body) = server.act(&session_id, "confirm_deploy").await;

    let dispatch_id = body["session"]["dispatch"]["id"].as_str().unwrap().to_owned();
    let dispatch = server.wait_for_dispatch(&dispatch_id, "failed").await;

    assert_eq!(dispatch["progress"], 0);
    assert_eq!(dispatch["status_text"], "User rejected the request.");
    assert_eq!(dispatch["notification"]["level"], "error");
    assert!(dispatch["tx_hash"].is_null());
    assert!(dispatch["created_wallet"].is_null());

    let session = server.session(&session_id).await;
    assert_eq!(session["screen"], "deploying");
    assert!(session["opened_wallet"].is_null());
}

#[tokio::test]
async fn existing_wallet_is_opened_by_address() {
    let server = TestServer::new(MockConnection::new());
    let session_id = server.create_session().await;
    server.act(&session_id, "get_started").await;
    server.act(&session_id, "add_existing_wallet").await;

    let (status, _) = server
        .post(
            "/api/v1/session/action",
            json!({ "session_id": session_id, "action": "view_wallet", "wallet_address": "0x12" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let wallet = Address::repeat_byte(0x42);
    let (status, body) = server
        .post(
            "/api/v1/session/action",
            json!({
                "session_id": session_id,
                "action": "view_wallet",
                "wallet_address": address_text(&wallet),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transition"], "open_wallet");
    assert_eq!(lowercase(&body["session"]["opened_wallet"]), address_text(&wallet));
}

#[tokio::test]
async fn wallet_dashboard_lists_filtered_transactions() {
    let connection = MockConnection::new();
    let wallet = Address::repeat_byte(0x55);
    connection.insert_wallet(treasury_snapshot(wallet));
    let server = TestServer::new(connection);

    let (status, body) =
        server.post("/api/v1/wallet/details", json!({ "wallet_address": address_text(&wallet) })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["wallet"]["name"], "Treasury");
    assert_eq!(body["wallet"]["balance"], "1.500000000000000000");
    assert_eq!(body["wallet"]["minimum_approvals"], 2);
    assert_eq!(body["wallet"]["created_on"], "2023-04-15");

    let (_, body) = server
        .post(
            "/api/v1/wallet/tx/list",
            json!({ "wallet_address": address_text(&wallet), "tab": "pending" }),
        )
        .await;
    let txs = body["txs"].as_array().unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0]["time"], "2023-04-12 - 03:31 AM");
    assert_eq!(txs[0]["approvals"], json!({ "collected": 1, "required": 2 }));

    let (_, body) = server
        .post(
            "/api/v1/wallet/tx/list",
            json!({ "wallet_address": address_text(&wallet), "search": "WITHDRAWAL" }),
        )
        .await;
    assert_eq!(body["txs"].as_array().unwrap().len(), 1);
    assert_eq!(body["txs"][0]["status"], "pending");

    let (status, _) = server
        .post(
            "/api/v1/wallet/tx/list",
            json!({ "wallet_address": address_text(&wallet), "tab": "archived" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = address_text(&Address::repeat_byte(0x66));
    let (status, _) = server.post("/api/v1/wallet/details", json!({ "wallet_address": unknown })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transactions_are_submitted_through_the_wallet() {
    let server = TestServer::new(MockConnection::new());
    let wallet = Address::repeat_byte(0x55);

    let (status, body) = server
        .post(
            "/api/v1/wallet/tx/submit",
            json!({
                "wallet_address": address_text(&wallet),
                "kind": "raw",
                "to": address_text(&BOB),
                "value": "abc",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "value");

    let (status, body) = server
        .post(
            "/api/v1/wallet/tx/submit",
            json!({
                "wallet_address": address_text(&wallet),
                "kind": "erc20",
                "to": address_text(&BOB),
                "token_address": address_text(&CAROL),
                "value": "1.5",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let dispatch_id = body["dispatch"]["id"].as_str().unwrap().to_owned();
    let dispatch = server.wait_for_dispatch(&dispatch_id, "confirmed").await;
    assert_eq!(dispatch["function_name"], "submitTransaction");
    assert_eq!(dispatch["status_text"], "Transaction confirmed");
    assert!(dispatch["created_wallet"].is_null());

    let calls = server.connection().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target(), wallet);
    assert_eq!(calls[0].call().signature(), "submitTransaction(address,address,uint256,bytes)");
}

#[tokio::test]
async fn counter_number_is_set_and_read_back() {
    let server = TestServer::new(MockConnection::new());

    let (status, body) = server.post("/api/v1/counter/get", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["number"], "0");

    let (status, _) = server.post("/api/v1/counter/set", json!({ "number": "-1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server.post("/api/v1/counter/set", json!({ "number": "42" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dispatch"]["function_name"], "setNumber");

    let dispatch_id = body["dispatch"]["id"].as_str().unwrap().to_owned();
    server.wait_for_dispatch(&dispatch_id, "confirmed").await;

    let calls = server.connection().calls();
    assert_eq!(calls[0].target(), COUNTER);

    let (_, body) = server.post("/api/v1/counter/get", json!({})).await;
    assert_eq!(body["number"], "42");
}

#[tokio::test]
async fn idle_sessions_expire() {
    let sessions = SessionStore::new(Duration::from_millis(200));
    let server = TestServer::with_sessions(MockConnection::new(), sessions.clone());

    let session_id = server.create_session().await;
    let (status, _) = server.act(&session_id, "get_started").await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(250)).await;

    let (status, _) = server.post("/api/v1/session/details", json!({ "session_id": session_id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.act(&session_id, "create_new_wallet").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    server.create_session().await;
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let server = TestServer::new(MockConnection::new());
    let unknown = "00000000-0000-0000-0000-000000000000";

    let (status, _) = server.post("/api/v1/session/details", json!({ "session_id": unknown })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.act(unknown, "get_started").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.post("/api/v1/dispatch/status", json!({ "dispatch_id": unknown })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
