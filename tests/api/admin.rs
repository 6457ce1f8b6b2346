use chrono::{DateTime, Utc};

use crate::helpers::TestApp;

#[tokio::test]
async fn list_returns_an_empty_list_when_there_are_no_subscribers() {
    let test_app = TestApp::spawn_app().await;

    let (status, body) = test_app.get_newsletter_json("admin=view").await;

    assert_eq!(200, status);
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 0);
    assert_eq!(body["emails"], serde_json::json!([]));
}

#[tokio::test]
async fn list_returns_every_subscriber_newest_first() {
    let test_app = TestApp::spawn_app().await;
    let started_at = test_app.database_now().await;
    let emails = ["one@test.com", "two@test.com", "three@test.com"];

    for email in emails {
        test_app.subscribe(email).await;
    }

    let (status, body) = test_app.get_newsletter_json("admin=view").await;

    assert_eq!(200, status);
    assert_eq!(body["total"], 3);

    let listed = body["emails"].as_array().unwrap();
    let listed_emails: Vec<&str> = listed
        .iter()
        .map(|subscriber| subscriber["email"].as_str().unwrap())
        .collect();

    assert_eq!(listed_emails, vec!["three@test.com", "two@test.com", "one@test.com"]);

    for subscriber in listed {
        let created_at: DateTime<Utc> =
            serde_json::from_value(subscriber["created_at"].clone()).unwrap();

        assert!(subscriber["id"].as_i64().unwrap() > 0);
        assert!(created_at >= started_at);
    }
}

#[tokio::test]
async fn read_operations_do_not_change_their_results() {
    let test_app = TestApp::spawn_app().await;

    test_app.subscribe("frank@test.com").await;

    for query in ["admin=view", "stats", "check"] {
        let first = test_app.get_newsletter_json(query).await;
        let second = test_app.get_newsletter_json(query).await;

        assert_eq!(first, second, "Results changed between two calls of ?{}", query);
    }

    let first_export = test_app.get_newsletter("export=csv").await.text().await.unwrap();
    let second_export = test_app.get_newsletter("export=csv").await.text().await.unwrap();

    assert_eq!(first_export, second_export);
    assert_eq!(test_app.subscriber_count().await, 1);
}

#[tokio::test]
async fn export_returns_a_semicolon_separated_attachment() {
    let test_app = TestApp::spawn_app().await;

    test_app.subscribe("a@x.com").await;
    test_app.subscribe("b@x.com").await;
    test_app.set_created_at("a@x.com", "2024-03-01 18:05:07+00").await;
    test_app.set_created_at("b@x.com", "2024-03-02 09:30:00+00").await;

    let response = test_app.get_newsletter("export=csv").await;

    assert_eq!(200, response.status().as_u16());

    let headers = response.headers();
    let content_type = headers["content-type"].to_str().unwrap();
    let disposition = headers["content-disposition"].to_str().unwrap();
    let expected_filename = format!("newsletter_subscribers_{}.csv", Utc::now().format("%Y-%m-%d"));

    assert!(content_type.starts_with("text/csv"));
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(&expected_filename));

    let body = response.text().await.unwrap();

    assert_eq!(
        body,
        "Email;Data Abonarii\n\
         b@x.com;2024-03-02 09:30:00\n\
         a@x.com;2024-03-01 18:05:07\n"
    );
}

#[tokio::test]
async fn stats_are_zero_for_an_empty_table() {
    let test_app = TestApp::spawn_app().await;

    let (status, body) = test_app.get_newsletter_json("stats").await;

    assert_eq!(200, status);
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["total_subscribers"], 0);
    assert_eq!(body["stats"]["this_week"], 0);
    assert_eq!(body["stats"]["this_month"], 0);
    assert_eq!(body["stats"]["growth_rate"].as_f64(), Some(0.0));
    assert_eq!(body["stats"]["recent_subscribers"], serde_json::json!([]));
}

#[tokio::test]
async fn stats_count_subscribers_by_age() {
    let test_app = TestApp::spawn_app().await;

    test_app.subscribe("fresh@test.com").await;
    test_app.subscribe("weeks@test.com").await;
    test_app.subscribe("old@test.com").await;
    sqlx::query(
        r#"
        UPDATE newsletter_emails
        SET created_at = CASE email
            WHEN 'weeks@test.com' THEN now() - INTERVAL '10 days'
            WHEN 'old@test.com' THEN now() - INTERVAL '40 days'
            ELSE created_at
        END
        "#,
    )
    .execute(&test_app.db_pool)
    .await
    .expect("Failed to age subscribers.");

    let (status, body) = test_app.get_newsletter_json("stats").await;
    let stats = &body["stats"];

    assert_eq!(200, status);
    assert_eq!(stats["total_subscribers"], 3);
    assert_eq!(stats["this_week"], 1);
    assert_eq!(stats["this_month"], 2);
    assert_eq!(stats["growth_rate"].as_f64(), Some(33.33));

    let recent: Vec<&str> = stats["recent_subscribers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|subscriber| subscriber["email"].as_str().unwrap())
        .collect();

    assert_eq!(recent, vec!["fresh@test.com", "weeks@test.com", "old@test.com"]);
}

#[tokio::test]
async fn stats_only_list_the_five_most_recent_subscribers() {
    let test_app = TestApp::spawn_app().await;

    for index in 0..7 {
        test_app.subscribe(&format!("reader{}@test.com", index)).await;
    }

    let (_, body) = test_app.get_newsletter_json("stats").await;

    assert_eq!(body["stats"]["total_subscribers"], 7);
    assert_eq!(body["stats"]["recent_subscribers"].as_array().unwrap().len(), 5);
    assert_eq!(
        body["stats"]["recent_subscribers"][0]["email"],
        "reader6@test.com"
    );
}

#[tokio::test]
async fn delete_removes_the_subscriber_once() {
    let test_app = TestApp::spawn_app().await;
    let subscriber_id = test_app.subscribe("frank@test.com").await;
    let query = format!("delete&id={}", subscriber_id);

    let (status, body) = test_app.get_newsletter_json(&query).await;

    assert_eq!(200, status);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "deleted successfully");
    assert_eq!(test_app.subscriber_count().await, 0);

    let (status, body) = test_app.get_newsletter_json(&query).await;

    assert_eq!(404, status);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "subscriber not found");
}

#[tokio::test]
async fn delete_with_non_numeric_id_matches_no_subscriber() {
    let test_app = TestApp::spawn_app().await;

    test_app.subscribe("frank@test.com").await;

    let (status, _) = test_app.get_newsletter_json("delete&id=abc").await;

    assert_eq!(404, status);
    assert_eq!(test_app.subscriber_count().await, 1);
}

#[tokio::test]
async fn deleted_email_can_subscribe_again_with_a_new_id() {
    let test_app = TestApp::spawn_app().await;
    let first_id = test_app.subscribe("frank@test.com").await;

    test_app
        .get_newsletter_json(&format!("delete&id={}", first_id))
        .await;
    let second_id = test_app.subscribe("frank@test.com").await;

    assert!(second_id > first_id);
}

#[tokio::test]
async fn check_reports_server_information() {
    let test_app = TestApp::spawn_app().await;

    let (status, body) = test_app.get_newsletter_json("check").await;

    assert_eq!(200, status);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "API is working");
    assert_eq!(body["server_info"]["database"], test_app.config.get_db_name());
    assert_eq!(body["server_info"]["host"], test_app.config.get_db_host());
    assert!(!body["server_info"]["database_version"]
        .as_str()
        .unwrap()
        .is_empty());
    assert!(body["server_info"]["runtime_version"]
        .as_str()
        .unwrap()
        .starts_with("newsletter-signup/"));
}

#[tokio::test]
async fn unknown_get_parameters_return_400() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![
        ("", "no parameters"),
        ("admin=edit", "unknown admin value"),
        ("export=xlsx", "unknown export format"),
        ("delete", "delete without id"),
    ];

    for (query, description) in test_cases {
        let (status, body) = test_app.get_newsletter_json(query).await;

        assert_eq!(400, status, "The API did not fail with 400 for {}", description);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "invalid GET parameters, use ?check for testing"
        );
    }
}
