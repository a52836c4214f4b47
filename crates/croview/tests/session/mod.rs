use croview::session::{Credentials, Registration, Role};

use super::*;

async fn mount_login(server: &MockServer, template: ResponseTemplate) {
  Mock::given(method("POST"))
    .and(path("/api/auth/login"))
    .respond_with(template)
    .mount(server)
    .await;
}

#[traced_test]
#[tokio::test]
async fn test_login_persists_session() -> TestResult {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/auth/login"))
    .and(body_json(json!({ "email": "ada@example.com", "password": "hunter2" })))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh", "user": user_json() })),
    )
    .expect(1)
    .mount(&server)
    .await;

  let storage = MemoryStore::shared();
  let mut session = SessionStore::restore(storage.clone());
  let before = session.epoch();

  let user = session.login(&api_for(&server), &Credentials::new("ada@example.com", "hunter2")).await?;
  assert_eq!(user.first_name, "Ada");
  assert_eq!(user.role, Role::User);

  assert!(session.is_authenticated());
  assert!(session.epoch() > before);
  assert_eq!(session.auth_headers().get("authorization").unwrap(), "Bearer fresh");
  assert_eq!(storage.get(AUTH_TOKEN_KEY)?, Some("fresh".to_string()));

  // A second process sees the same session.
  let restored = SessionStore::restore(storage);
  assert_eq!(restored.user(), session.user());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_login_rejection_surfaces_service_message() {
  let server = MockServer::start().await;
  mount_login(
    &server,
    ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid email or password" })),
  )
  .await;

  let mut session = signed_out();
  let err = session
    .login(&api_for(&server), &Credentials::new("ada@example.com", "wrong"))
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "Invalid email or password");
  assert!(!session.is_authenticated());
}

#[traced_test]
#[tokio::test]
async fn test_login_rejection_without_body() {
  let server = MockServer::start().await;
  mount_login(&server, ResponseTemplate::new(500)).await;

  let (mut session, storage) = signed_in();
  let err = session
    .login(&api_for(&server), &Credentials::new("ada@example.com", "hunter2"))
    .await
    .unwrap_err();
  assert_eq!(err.to_string(), "Login failed");
  // A failed login leaves the existing session alone.
  assert!(session.is_authenticated());
  assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap(), Some(TOKEN.to_string()));
}

#[traced_test]
#[tokio::test]
async fn test_login_unreachable_service() {
  // Nothing listens on a port we just released.
  let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
  let base = Url::parse(&format!("http://127.0.0.1:{port}")).unwrap();
  let api = ApiClient::new(base.clone(), base).unwrap();

  let mut session = signed_out();
  let err = session.login(&api, &Credentials::new("ada@example.com", "hunter2")).await.unwrap_err();
  assert_eq!(err.to_string(), "Network error occurred");
}

#[traced_test]
#[tokio::test]
async fn test_register_signs_in() -> TestResult {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/auth/register"))
    .and(body_json(json!({
      "email": "grace@example.com",
      "password": "cobol",
      "firstName": "Grace",
      "lastName": "Hopper"
    })))
    .respond_with(ResponseTemplate::new(201).set_body_json(json!({
      "token": "new-account",
      "user": {
        "id": "u2",
        "email": "grace@example.com",
        "firstName": "Grace",
        "lastName": "Hopper",
        "role": "user"
      }
    })))
    .expect(1)
    .mount(&server)
    .await;

  let registration = Registration {
    email:      "grace@example.com".into(),
    password:   "cobol".into(),
    first_name: "Grace".into(),
    last_name:  "Hopper".into(),
  };
  let mut session = signed_out();
  let user = session.register(&api_for(&server), &registration).await?;
  assert_eq!(user.id, "u2");
  assert_eq!(session.auth_headers().get("authorization").unwrap(), "Bearer new-account");
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_register_rejection() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/auth/register"))
    .respond_with(ResponseTemplate::new(400).set_body_string("nope"))
    .mount(&server)
    .await;

  let registration = Registration {
    email:      "grace@example.com".into(),
    password:   "cobol".into(),
    first_name: "Grace".into(),
    last_name:  "Hopper".into(),
  };
  let mut session = signed_out();
  let err = session.register(&api_for(&server), &registration).await.unwrap_err();
  assert_eq!(err.to_string(), "Registration failed");
}

#[test]
fn test_google_auth_url_comes_from_config() -> TestResult {
  let api = ApiClient::from_config(&croview::Config::default())?;
  assert_eq!(api.google_auth_url().as_str(), "http://localhost:8080/auth/google");

  let custom = croview::Config {
    oauth_url: Url::parse("https://login.example.com/auth/google")?,
    ..Default::default()
  };
  assert_eq!(ApiClient::from_config(&custom)?.google_auth_url().host_str(), Some("login.example.com"));
  Ok(())
}
