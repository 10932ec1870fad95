//! Integration tests for the marketplace API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, backed by the in-memory store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use chrono::{DateTime, Utc};
use marketplace_api::router::build_router;
use marketplace_api::state::AppState;
use marketplace_core::{Marketplace, MemoryMarketplace};
use marketplace_types::{
    Contract, ContractStatus, Job, NewContract, NewJob, NewProfile, Profile, ProfileKind,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use tower::ServiceExt;

type State = Arc<AppState<MemoryMarketplace>>;

fn make_test_state() -> State {
    Arc::new(AppState::new(MemoryMarketplace::new(), 2))
}

async fn profile(state: &State, balance: Decimal) -> Profile {
    state
        .store
        .create_profile(NewProfile {
            first_name: "Harry".to_owned(),
            last_name: "Potter".to_owned(),
            profession: "Wizard".to_owned(),
            balance,
            kind: ProfileKind::Client,
        })
        .await
        .unwrap()
}

async fn named(state: &State, first: &str, profession: &str) -> Profile {
    state
        .store
        .create_profile(NewProfile {
            first_name: first.to_owned(),
            last_name: "Granger".to_owned(),
            profession: profession.to_owned(),
            balance: dec!(1150),
            kind: ProfileKind::Contractor,
        })
        .await
        .unwrap()
}

async fn contract(state: &State, client: &Profile, contractor: &Profile, status: ContractStatus) -> Contract {
    state
        .store
        .create_contract(NewContract {
            terms: "new contract".to_owned(),
            status,
            client_id: client.id,
            contractor_id: contractor.id,
        })
        .await
        .unwrap()
}

async fn job(state: &State, contract: &Contract, price: Decimal, paid_at: Option<&str>) -> Job {
    let payment_date = paid_at.map(|at| at.parse::<DateTime<Utc>>().unwrap());
    state
        .store
        .create_job(NewJob {
            description: "work".to_owned(),
            price,
            paid: payment_date.map(|_| true),
            payment_date,
            contract_id: contract.id,
        })
        .await
        .unwrap()
}

async fn send(state: &State, request: Request<Body>) -> Response {
    build_router(Arc::clone(state)).oneshot(request).await.unwrap()
}

fn get(uri: &str, caller: Option<&Profile>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(caller) = caller {
        builder = builder.header("profile_id", caller.id.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, caller: Option<&Profile>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(caller) = caller {
        builder = builder.header("profile_id", caller.id.to_string());
    }
    let body = body.map_or_else(Body::empty, |b| Body::from(b.to_string()));
    builder.body(body).unwrap()
}

async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const IN_RANGE: Option<&str> = Some("2020-08-20T10:00:00Z");
const OUT_OF_RANGE: Option<&str> = Some("2021-01-01T00:00:00Z");
const WINDOW: &str = "start=2020-08-15T00:00:00.000Z&end=2020-08-31T00:00:00.000Z";

// =========================================================================
// Health and authentication
// =========================================================================

#[tokio::test]
async fn test_health_needs_no_caller() {
    let state = make_test_state();
    let response = send(&state, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_routes_require_profile_header() {
    let state = make_test_state();
    for uri in [
        "/contracts",
        "/contracts/1",
        "/jobs/unpaid",
        "/balances/history",
        "/admin/best-profession",
        "/admin/best-clients",
    ] {
        let response = send(&state, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    for uri in ["/jobs/1/pay", "/balances/deposit/1"] {
        let response = send(&state, post(uri, None, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_or_malformed_caller_is_unauthorized() {
    let state = make_test_state();
    let request = Request::get("/contracts")
        .header("profile_id", "99")
        .body(Body::empty())
        .unwrap();
    let response = send(&state, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_to_json(response).await;
    assert_eq!(json["status"], 401);

    let request = Request::get("/contracts")
        .header("profile_id", "abc")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send(&state, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_caller_is_checked_before_path() {
    let state = make_test_state();
    let response = send(&state, get("/contracts/not-a-number", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user = profile(&state, dec!(0)).await;
    let response = send(&state, get("/contracts/not-a-number", Some(&user))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =========================================================================
// Contracts
// =========================================================================

#[tokio::test]
async fn test_get_contract_only_for_parties() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(0)).await;
    let user2 = profile(&state, dec!(0)).await;
    let user3 = profile(&state, dec!(0)).await;
    let c = contract(&state, &user1, &user2, ContractStatus::Terminated).await;
    let uri = format!("/contracts/{}", c.id);

    let response = send(&state, get(&uri, Some(&user3))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_json(response).await["error"], "Contract not found");

    let response = send(&state, get(&uri, Some(&user2))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["id"], c.id.into_inner());
    assert_eq!(json["ClientId"], user1.id.into_inner());
    assert_eq!(json["ContractorId"], user2.id.into_inner());
    assert_eq!(json["status"], "terminated");
}

#[tokio::test]
async fn test_list_contracts_skips_terminated_and_foreign() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(0)).await;
    let user2 = profile(&state, dec!(0)).await;
    let user3 = profile(&state, dec!(0)).await;
    let new = contract(&state, &user1, &user2, ContractStatus::New).await;
    let in_progress = contract(&state, &user2, &user1, ContractStatus::InProgress).await;
    contract(&state, &user1, &user2, ContractStatus::Terminated).await;
    contract(&state, &user3, &user2, ContractStatus::New).await;

    let response = send(&state, get("/contracts", Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    let ids: Vec<i64> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![new.id.into_inner(), in_progress.id.into_inner()]);
}

// =========================================================================
// Jobs
// =========================================================================

#[tokio::test]
async fn test_unpaid_jobs_for_active_contracts_only() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(0)).await;
    let user2 = profile(&state, dec!(0)).await;
    let user3 = profile(&state, dec!(0)).await;

    let new1 = contract(&state, &user1, &user2, ContractStatus::New).await;
    let new2 = contract(&state, &user3, &user2, ContractStatus::New).await;
    let prog1 = contract(&state, &user1, &user2, ContractStatus::InProgress).await;
    let prog2 = contract(&state, &user3, &user2, ContractStatus::InProgress).await;
    let term1 = contract(&state, &user1, &user2, ContractStatus::Terminated).await;
    let term2 = contract(&state, &user3, &user2, ContractStatus::Terminated).await;

    let expected = job(&state, &new1, dec!(10), None).await;
    job(&state, &new2, dec!(10), IN_RANGE).await;
    job(&state, &prog1, dec!(10), IN_RANGE).await;
    job(&state, &prog2, dec!(10), None).await;
    job(&state, &term1, dec!(10), None).await;
    job(&state, &term2, dec!(10), IN_RANGE).await;

    let response = send(&state, get("/jobs/unpaid", Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    let jobs = json.as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["id"], expected.id.into_inner());
    assert_eq!(jobs[0]["paid"], false);
}

#[tokio::test]
async fn test_pay_job_moves_balance_once() {
    let state = make_test_state();
    let client = profile(&state, dec!(1000)).await;
    let contractor = profile(&state, dec!(0)).await;
    let c = contract(&state, &client, &contractor, ContractStatus::InProgress).await;
    let j = job(&state, &c, dec!(500), None).await;
    let uri = format!("/jobs/{}/pay", j.id);

    let response = send(&state, post(&uri, Some(&client), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["paid"], true);
    assert!(json["paymentDate"].is_string());

    let client_after = state.store.find_profile(client.id).await.unwrap().unwrap();
    let contractor_after = state.store.find_profile(contractor.id).await.unwrap().unwrap();
    assert_eq!(client_after.balance, dec!(500));
    assert_eq!(contractor_after.balance, dec!(500));

    let response = send(&state, post(&uri, Some(&client), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["error"], "Job already paid");
}

#[tokio::test]
async fn test_pay_job_rejections() {
    let state = make_test_state();
    let client = profile(&state, dec!(100)).await;
    let contractor = profile(&state, dec!(0)).await;
    let c = contract(&state, &client, &contractor, ContractStatus::InProgress).await;
    let j = job(&state, &c, dec!(100), None).await;
    let uri = format!("/jobs/{}/pay", j.id);

    let response = send(&state, post(&uri, Some(&contractor), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_json(response).await["error"], "Job not found");

    let response = send(&state, post(&uri, Some(&client), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["error"], "Insufficient funds");

    let response = send(&state, post("/jobs/999/pay", Some(&client), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Balances
// =========================================================================

#[tokio::test]
async fn test_deposit_without_amount() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(1150)).await;

    let response = send(&state, post("/balances/deposit/200", Some(&user1), None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_json(response).await["error"], "Amount not provided");
}

#[tokio::test]
async fn test_deposit_to_missing_profile() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(1150)).await;

    let body = serde_json::json!({ "amount": 100 });
    let response = send(&state, post("/balances/deposit/200", Some(&user1), Some(body))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_json(response).await["error"], "Client not found");
}

#[tokio::test]
async fn test_deposit_over_cap_is_rejected() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(100)).await;
    let user2 = profile(&state, dec!(100)).await;
    let c = contract(&state, &user1, &user2, ContractStatus::Terminated).await;
    job(&state, &c, dec!(399), None).await;

    let uri = format!("/balances/deposit/{}", user1.id);
    let body = serde_json::json!({ "amount": 100 });
    let response = send(&state, post(&uri, Some(&user1), Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_to_json(response).await["error"],
        "Cannot deposit more than 25% of unpaid jobs amount"
    );
}

#[tokio::test]
async fn test_deposit_within_cap_updates_balance_and_history() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(100)).await;
    let user2 = profile(&state, dec!(100)).await;
    let c = contract(&state, &user1, &user2, ContractStatus::Terminated).await;
    job(&state, &c, dec!(401), None).await;

    let uri = format!("/balances/deposit/{}", user1.id);
    let body = serde_json::json!({ "amount": 100 });
    let response = send(&state, post(&uri, Some(&user1), Some(body))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["balance"], 200.0);

    let response = send(&state, get("/balances/history", Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["entryType"], "deposit");
    assert_eq!(entries[0]["amount"], 100.0);

    let response = send(&state, get("/balances/history", Some(&user2))).await;
    assert_eq!(body_to_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_deposit_rejects_bad_amounts() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(100)).await;
    let uri = format!("/balances/deposit/{}", user1.id);

    for amount in [serde_json::json!(-5), serde_json::json!(0), serde_json::json!(1.234)] {
        let body = serde_json::json!({ "amount": amount });
        let response = send(&state, post(&uri, Some(&user1), Some(body))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{amount}");
    }

    let body = serde_json::json!({ "amount": [1] });
    let response = send(&state, post(&uri, Some(&user1), Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deposit_above_money_limit_is_bad_request() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(100)).await;
    let uri = format!("/balances/deposit/{}", user1.id);

    let body = serde_json::json!({ "amount": 100_000_000_000_000_i64 });
    let response = send(&state, post(&uri, Some(&user1), Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "Amount must not exceed 9999999999.99");

    let body = serde_json::json!({ "amount": 9_999_999_999_i64 });
    let response = send(&state, post(&uri, Some(&user1), Some(body))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response).await;
    assert_eq!(json["error"], "Balance cannot exceed 9999999999.99");

    let after = state.store.find_profile(user1.id).await.unwrap().unwrap();
    assert_eq!(after.balance, dec!(100));
}

// =========================================================================
// Admin reports
// =========================================================================

#[tokio::test]
async fn test_reports_require_dates() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(0)).await;

    for path in ["/admin/best-profession", "/admin/best-clients"] {
        let response = send(&state, get(path, Some(&user1))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_to_json(response).await["error"],
            "Start date not provided or invalid"
        );

        let uri = format!("{path}?start=2020-08-15T00:00:00.000Z");
        let response = send(&state, get(&uri, Some(&user1))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_to_json(response).await["error"],
            "End date not provided or invalid"
        );
    }
}

#[tokio::test]
async fn test_best_profession_counts_paid_jobs_in_range() {
    let state = make_test_state();
    let user1 = profile(&state, dec!(0)).await;
    let user2 = profile(&state, dec!(0)).await;
    let c = contract(&state, &user1, &user2, ContractStatus::Terminated).await;
    job(&state, &c, dec!(100), IN_RANGE).await;
    job(&state, &c, dec!(100), None).await;
    job(&state, &c, dec!(100), OUT_OF_RANGE).await;

    let uri = format!("/admin/best-profession?{WINDOW}");
    let response = send(&state, get(&uri, Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["profession"], "Wizard");
    assert_eq!(rows[0]["total_earnings"], 100.0);
}

#[tokio::test]
async fn test_best_profession_ranks_by_earnings() {
    let state = make_test_state();
    let client = profile(&state, dec!(0)).await;
    let painter = named(&state, "Pat", "Painter").await;
    let welder = named(&state, "Wes", "Welder").await;
    let paint = contract(&state, &client, &painter, ContractStatus::InProgress).await;
    let weld = contract(&state, &client, &welder, ContractStatus::InProgress).await;
    job(&state, &paint, dec!(50), IN_RANGE).await;
    job(&state, &weld, dec!(80), IN_RANGE).await;

    let uri = format!("/admin/best-profession?{WINDOW}");
    let json = body_to_json(send(&state, get(&uri, Some(&client))).await).await;
    assert_eq!(json[0]["profession"], "Welder");
    assert_eq!(json[1]["profession"], "Painter");
}

async fn two_clients(state: &State) -> (Profile, Profile) {
    let user1 = profile(state, dec!(0)).await;
    let user2 = named(state, "Hermione", "Wizard").await;
    let c1 = contract(state, &user1, &user2, ContractStatus::Terminated).await;
    let c2 = contract(state, &user2, &user1, ContractStatus::Terminated).await;

    job(state, &c1, dec!(100), IN_RANGE).await;
    job(state, &c1, dec!(100), None).await;
    job(state, &c1, dec!(100), OUT_OF_RANGE).await;

    job(state, &c2, dec!(200), IN_RANGE).await;
    job(state, &c2, dec!(200), None).await;
    job(state, &c2, dec!(200), OUT_OF_RANGE).await;
    (user1, user2)
}

#[tokio::test]
async fn test_best_clients_ranked_by_spending() {
    let state = make_test_state();
    let (user1, user2) = two_clients(&state).await;

    let uri = format!("/admin/best-clients?{WINDOW}");
    let response = send(&state, get(&uri, Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], user2.id.into_inner());
    assert_eq!(rows[0]["fullName"], "Hermione Granger");
    assert_eq!(rows[0]["paid"], 200.0);
    assert_eq!(rows[1]["id"], user1.id.into_inner());
    assert_eq!(rows[1]["fullName"], "Harry Potter");
    assert_eq!(rows[1]["paid"], 100.0);
}

#[tokio::test]
async fn test_best_clients_honours_limit() {
    let state = make_test_state();
    let (user1, user2) = two_clients(&state).await;

    let uri = format!("/admin/best-clients?{WINDOW}&limit=1");
    let json = body_to_json(send(&state, get(&uri, Some(&user1))).await).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], user2.id.into_inner());

    let uri = format!("/admin/best-clients?{WINDOW}&limit=-1");
    let response = send(&state, get(&uri, Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inverted_window_is_empty() {
    let state = make_test_state();
    let (user1, _) = two_clients(&state).await;

    let uri = "/admin/best-clients?start=2020-08-31&end=2020-08-15";
    let response = send(&state, get(uri, Some(&user1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_json(response).await, serde_json::json!([]));
}
