use strava_client::config::Config;
use strava_client::http_client::ReqwestStravaClient;
use strava_client::{ActivityQuery, StravaClient, StravaError};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ReqwestStravaClient {
    let uri = server.uri();
    let cfg = Config::from_env_with(|k| match k {
        "STRAVA_CLIENT_ID" => Some("12345".into()),
        "STRAVA_CLIENT_SECRET" => Some("sekrit".into()),
        "STRAVA_REFRESH_TOKEN" => Some("refresh-1".into()),
        "STRAVA_API_BASE_URL" => Some(format!("{uri}/api/v3")),
        "STRAVA_OAUTH_TOKEN_URL" => Some(format!("{uri}/oauth/token")),
        _ => None,
    })
    .expect("cfg");
    ReqwestStravaClient::new(cfg).expect("client")
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    let expires_at = chrono::Utc::now().timestamp() + 6 * 3600;
    serde_json::json!({
        "token_type": "Bearer",
        "access_token": access,
        "expires_at": expires_at,
        "expires_in": 21600,
        "refresh_token": refresh
    })
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=12345"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("acc-1", "refresh-1")))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn get_athlete_refreshes_token_and_sends_bearer() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete"))
        .and(header("authorization", "Bearer acc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 42,
            "firstname": "Ada",
            "lastname": "Runner",
            "city": "Lisbon"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let athlete = client.get_athlete().await.expect("athlete");
    assert_eq!(athlete.id, 42);
    assert_eq!(athlete.firstname.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn access_token_is_cached_between_requests() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let q = ActivityQuery::default();
    client.get_activities(&q).await.expect("first");
    client.get_activities(&q).await.expect("second");
    // MockServer verifies the `.expect` counts on drop
}

#[tokio::test]
async fn activities_forward_query_parameters() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .and(query_param("after", "1700000000"))
        .and(query_param("per_page", "200"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 1,
                "name": "Morning Run",
                "distance": 5012.3,
                "moving_time": 1500,
                "sport_type": "Run",
                "start_date_local": "2025-02-03T07:00:00Z"
            },
            {"id": 2, "name": "Commute", "distance": 8000.0, "sport_type": "Ride"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let acts = client
        .get_activities(&ActivityQuery {
            after: Some(1_700_000_000),
            page: Some(2),
            per_page: Some(200),
            ..Default::default()
        })
        .await
        .expect("activities");
    assert_eq!(acts.len(), 2);
    assert!(acts[0].is_run());
    assert!(!acts[1].is_run());
}

#[tokio::test]
async fn non_success_status_maps_to_upstream_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athletes/42/stats"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_athlete_stats(42).await.unwrap_err();
    match err {
        StravaError::Upstream { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn failed_token_refresh_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad refresh token"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.get_athlete().await.unwrap_err();
    assert!(matches!(err, StravaError::Auth(ref m) if m.contains("400")));
    // no API call should have been attempted
    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|r| r.url.path() == "/oauth/token"));
}

#[tokio::test]
async fn unauthorized_response_drops_cached_token() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(client.get_athlete().await, Err(StravaError::Auth(_))));
    assert!(matches!(client.get_athlete().await, Err(StravaError::Auth(_))));
}

#[tokio::test]
async fn rotated_refresh_token_is_used_next_time() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("acc-1", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("refresh_token=refresh-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("acc-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.refresh_access_token().await.expect("first");
    assert_eq!(first.access_token, "acc-1");
    let second = client.refresh_access_token().await.expect("second");
    assert_eq!(second.access_token, "acc-2");
}

#[tokio::test]
async fn non_array_activities_payload_is_an_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete/activities"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "nope"})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .get_activities(&ActivityQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, StravaError::Http(_)));
}

#[tokio::test]
async fn slow_upstream_fails_with_timeout_error() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/athlete"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"id": 42}))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let cfg = Config::from_env_with(|k| match k {
        "STRAVA_CLIENT_ID" => Some("12345".into()),
        "STRAVA_CLIENT_SECRET" => Some("sekrit".into()),
        "STRAVA_REFRESH_TOKEN" => Some("refresh-1".into()),
        "STRAVA_API_BASE_URL" => Some(format!("{uri}/api/v3")),
        "STRAVA_OAUTH_TOKEN_URL" => Some(format!("{uri}/oauth/token")),
        "STRAVA_TIMEOUT_SECS" => Some("1".into()),
        _ => None,
    })
    .expect("cfg");
    let client = ReqwestStravaClient::new(cfg).expect("client");

    let err = client.get_athlete().await.unwrap_err();
    match err {
        StravaError::Http(e) => assert!(e.is_timeout(), "expected timeout, got {e}"),
        other => panic!("unexpected error: {other:?}"),
    }
}
