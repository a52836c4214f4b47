use super::*;

#[traced_test]
#[tokio::test]
async fn test_fetch_without_session_is_empty_and_silent() {
  let server = MockServer::start().await;
  forbid_requests(&server).await;

  let mut store = RemoteStore::new(api_for(&server));
  assert!(store.is_loading());

  store.fetch_reports(&signed_out()).await.unwrap();
  assert!(store.reports().is_empty());
  assert!(!store.is_loading());
  assert_eq!(store.error(), None);
}

#[traced_test]
#[tokio::test]
async fn test_fetch_replaces_collection_in_service_order() -> TestResult {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!([report_json("b", "processing"), report_json("a", "completed")])),
    )
    .expect(1)
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  store.fetch_reports(&session).await?;

  let ids: Vec<&str> = store.reports().iter().map(|r| r.id.as_str()).collect();
  assert_eq!(ids, ["b", "a"]);
  assert_eq!(store.reports()[0].status, ReportStatus::Processing);
  assert_eq!(store.reports()[1].created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
  assert!(!store.is_loading());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_failed_refresh_keeps_previous_collection() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([report_json("a", "pending")])))
    .up_to_n_times(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  store.fetch_reports(&session).await.unwrap();

  let err = store.fetch_reports(&session).await.unwrap_err();
  assert_eq!(err.to_string(), "Failed to fetch reports: Internal Server Error");
  assert_eq!(store.error(), Some("Failed to fetch reports: Internal Server Error"));
  assert_eq!(store.reports().len(), 1);
  assert!(!store.is_loading());
}

#[traced_test]
#[tokio::test]
async fn test_fetch_accepts_rows_with_null_fields() -> TestResult {
  let server = MockServer::start().await;
  let mut pending = report_json("p", "pending");
  pending["analysis"] = Value::Null;
  pending["metadata"] = Value::Null;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(
      ResponseTemplate::new(200).set_body_json(json!([pending, report_json("c", "completed")])),
    )
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  store.fetch_reports(&session).await?;

  assert_eq!(store.reports().len(), 2);
  assert_eq!(store.reports()[0].analysis, "");
  assert_eq!(store.reports()[0].metadata.word_count, 0);
  assert_eq!(store.error(), None);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_unreadable_list_names_the_operation() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  let err = store.fetch_reports(&session).await.unwrap_err();
  assert_eq!(err.to_string(), "Failed to fetch reports: unreadable response");
  assert_eq!(store.error(), Some("Failed to fetch reports: unreadable response"));
  assert!(store.reports().is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_logout_empties_collection() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([report_json("a", "completed")])))
    .expect(1)
    .mount(&server)
    .await;

  let (mut session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  assert!(store.refresh_if_auth_changed(&session).await.unwrap());
  assert!(!store.refresh_if_auth_changed(&session).await.unwrap());
  assert_eq!(store.reports().len(), 1);

  session.logout();
  assert!(store.refresh_if_auth_changed(&session).await.unwrap());
  assert!(store.reports().is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_create_without_session_fails_fast() {
  let server = MockServer::start().await;
  forbid_requests(&server).await;

  let mut store = RemoteStore::new(api_for(&server));
  let err = store.create_analysis(&signed_out(), "https://example.com").await.unwrap_err();
  assert!(matches!(err, CroError::Unauthenticated(_)));
  assert_eq!(err.to_string(), "User must be authenticated to create analysis");
}

#[traced_test]
#[tokio::test]
async fn test_create_rejects_bad_url_locally() {
  let server = MockServer::start().await;
  forbid_requests(&server).await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  assert!(matches!(
    store.create_analysis(&session, "not a url").await,
    Err(CroError::InvalidUrl(_))
  ));
  assert!(matches!(store.create_analysis(&session, "  ").await, Err(CroError::EmptyUrl)));
}

#[traced_test]
#[tokio::test]
async fn test_create_then_refresh() -> TestResult {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/cro/analyze"))
    .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
    .and(body_json(json!({ "url": "https://new.example.com" })))
    .respond_with(ResponseTemplate::new(201).set_body_json(report_json("new", "pending")))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!([report_json("new", "processing"), report_json("old", "completed")])),
    )
    .expect(1)
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  let created = store.create_analysis(&session, " https://new.example.com ").await?;

  assert_eq!(created.id, "new");
  assert_eq!(created.status, ReportStatus::Pending);
  // The collection reflects the refresh, not the creation response.
  assert_eq!(store.reports().len(), 2);
  assert_eq!(store.reports()[0].status, ReportStatus::Processing);
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_create_survives_failed_refresh() -> TestResult {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/cro/analyze"))
    .respond_with(ResponseTemplate::new(200).set_body_json(report_json("new", "pending")))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analyses"))
    .respond_with(ResponseTemplate::new(503))
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));
  let created = store.create_analysis(&session, "https://new.example.com").await?;
  assert_eq!(created.id, "new");
  assert_eq!(store.error(), Some("Failed to fetch reports: Service Unavailable"));
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_create_failure_messages() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/api/cro/analyze"))
    .respond_with(
      ResponseTemplate::new(429).set_body_json(json!({ "error": "Daily analysis limit reached" })),
    )
    .up_to_n_times(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/api/cro/analyze"))
    .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let mut store = RemoteStore::new(api_for(&server));

  let err = store.create_analysis(&session, "https://example.com").await.unwrap_err();
  assert_eq!(err.to_string(), "Daily analysis limit reached");

  let err = store.create_analysis(&session, "https://example.com").await.unwrap_err();
  assert_eq!(err.to_string(), "Failed to create analysis");
  assert!(store.reports().is_empty());
}

#[traced_test]
#[tokio::test]
async fn test_get_report_by_id() -> TestResult {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analysis/found"))
    .respond_with(ResponseTemplate::new(200).set_body_json(report_json("found", "completed")))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analysis/missing"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analysis/theirs"))
    .respond_with(ResponseTemplate::new(403))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analysis/broken"))
    .respond_with(ResponseTemplate::new(502))
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let store = RemoteStore::new(api_for(&server));

  let found = store.get_report_by_id(&session, "found").await?.expect("report should exist");
  assert_eq!(found.status, ReportStatus::Completed);
  assert!(found.updated_at > found.created_at);

  assert!(store.get_report_by_id(&session, "missing").await?.is_none());

  let denied = store.get_report_by_id(&session, "theirs").await.unwrap_err();
  assert!(matches!(denied, CroError::AccessDenied));
  assert_eq!(denied.to_string(), "Access denied");

  let broken = store.get_report_by_id(&session, "broken").await.unwrap_err();
  assert_eq!(broken.to_string(), "Failed to fetch report: Bad Gateway");

  // Lookups never touch the collection.
  assert!(store.reports().is_empty());
  Ok(())
}

#[traced_test]
#[tokio::test]
async fn test_get_without_session() {
  let server = MockServer::start().await;
  forbid_requests(&server).await;

  let store = RemoteStore::new(api_for(&server));
  let err = store.get_report_by_id(&signed_out(), "a").await.unwrap_err();
  assert_eq!(err.to_string(), "User must be authenticated to fetch report");
}

#[traced_test]
#[tokio::test]
async fn test_download_pdf() -> TestResult {
  let server = MockServer::start().await;
  let pdf = b"%PDF-1.7 fake report".to_vec();
  Mock::given(method("GET"))
    .and(path("/api/cro/analysis/abc/pdf"))
    .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
    .respond_with(ResponseTemplate::new(200).set_body_raw(pdf.clone(), "application/pdf"))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/api/cro/analysis/gone/pdf"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  let (session, _storage) = signed_in();
  let store = RemoteStore::new(api_for(&server));
  let dir = tempdir()?;
  let target = dir.path().join("downloads");

  let saved = store.download_pdf(&session, "abc", &target).await?;
  assert_eq!(saved, target.join("CRO_Report_abc.pdf"));
  assert_file_contents(&saved, &pdf);

  let err = store.download_pdf(&session, "gone", &target).await.unwrap_err();
  assert_eq!(err.to_string(), "Failed to download PDF: Not Found");
  assert!(!target.join("CRO_Report_gone.pdf").exists());

  let err = store.download_pdf(&signed_out(), "abc", &target).await.unwrap_err();
  assert_eq!(err.to_string(), "User must be authenticated to download report");
  Ok(())
}

#[test]
fn test_pdf_filenames_stay_distinct() {
  assert_eq!(pdf_filename("a_b-1"), "CRO_Report_a_b-1.pdf");
  assert_eq!(pdf_filename("a/b"), "CRO_Report_a%2Fb.pdf");
  assert_ne!(pdf_filename("a.b"), pdf_filename("a_b"));
  assert_ne!(pdf_filename("a/b"), pdf_filename("a_b"));
  assert!(!pdf_filename("../../etc/passwd").contains('/'));
}
