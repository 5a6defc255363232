// REST client tests against a mocked hosted backend

use case_pair::models::{NewSession, SessionFormat, TimeSlot};
use case_pair::services::{
    ProfileStore, SessionStore, StoreError, SupabaseClient, SupabaseError, SupabaseTables,
};
use chrono::NaiveDate;
use mockito::{Matcher, Server};

const API_KEY: &str = "service-key";

fn client(server: &Server) -> SupabaseClient {
    SupabaseClient::new(server.url(), API_KEY.to_string(), SupabaseTables::default(), 5).unwrap()
}

const PROFILE_ROW: &str = r#"[{
    "id": "u1",
    "first_name": "Jane",
    "last_name": "Doe",
    "email": "jane.doe@hec.edu",
    "phone_number": null,
    "level": "Medium",
    "consulting": true,
    "mna": false,
    "quant": false,
    "created_at": "2024-01-01T10:00:00Z"
}]"#;

const SESSION_ROW: &str = r#"[{
    "id": "9b2f0c7e-5f0e-4a57-9d43-3c8a5b1c2d11",
    "date": "2024-01-01",
    "time": "18:00:00",
    "format": "Video Call",
    "topic": "Market sizing",
    "participant1": "u1",
    "participant2": "u3",
    "meet_link": "https://meet.google.com/abc-defg-hij",
    "created_at": "2024-01-01T10:00:00Z"
}]"#;

#[tokio::test]
async fn test_get_profile_sends_keys_and_filters_by_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("select".into(), "*".into()),
            Matcher::UrlEncoded("id".into(), "eq.u1".into()),
        ]))
        .match_header("apikey", API_KEY)
        .match_header("authorization", "Bearer service-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROFILE_ROW)
        .create_async()
        .await;

    let profile = client(&server).get_profile("u1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(profile.first_name.as_deref(), Some("Jane"));
    assert!(profile.is_complete());
}

#[tokio::test]
async fn test_missing_profile_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let result = client(&server).get_profile("ghost").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_sessions_for_uses_membership_filter() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/rest/v1/sessions")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded(
                "or".into(),
                r#"(participant1.in.("u1","u2"),participant2.in.("u1","u2"))"#.into(),
            ),
            Matcher::UrlEncoded("order".into(), "date.desc,time.desc".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(SESSION_ROW)
        .create_async()
        .await;

    let sessions = client(&server).sessions_for(&["u1", "u2"]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].time.as_str(), "18:00");
    assert_eq!(sessions[0].format, SessionFormat::VideoCall);
    assert_eq!(sessions[0].partner_of("u1"), Some("u3"));
}

#[tokio::test]
async fn test_sessions_for_nobody_skips_the_request() {
    let server = Server::new_async().await;
    let sessions = client(&server).sessions_for(&[]).await.unwrap();
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_insert_session_asks_for_representation() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/sessions")
        .match_header("prefer", "return=representation")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "participant1": "u1",
            "participant2": "u3",
            "time": "18:00",
            "format": "Video Call"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(SESSION_ROW)
        .create_async()
        .await;

    let new = NewSession::paired(
        "u1",
        "u3",
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        TimeSlot::default(),
        SessionFormat::VideoCall,
        Some("Market sizing".to_string()),
        Some("https://meet.google.com/abc-defg-hij".to_string()),
    );
    let stored = client(&server).insert_session(&new).await.unwrap();

    mock.assert_async().await;
    assert_eq!(stored.id, "9b2f0c7e-5f0e-4a57-9d43-3c8a5b1c2d11");
    assert!(stored.is_matched());
}

#[tokio::test]
async fn test_delete_of_unknown_session_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/rest/v1/sessions")
        .match_query(Matcher::UrlEncoded("id".into(), "eq.missing".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let result = client(&server).delete_session("missing").await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_rejected_key_is_unauthorized() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/sessions")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"message":"Invalid API key"}"#)
        .create_async()
        .await;

    let result = client(&server).list_sessions().await;
    assert!(matches!(
        result,
        Err(StoreError::Supabase(SupabaseError::Unauthorized))
    ));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/rest/v1/profiles")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let result = client(&server).list_profiles().await;
    assert!(matches!(
        result,
        Err(StoreError::Supabase(SupabaseError::ApiError(_)))
    ));
}
