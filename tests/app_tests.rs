mod common;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;

use chrono_minerals::config::RegistrationMode;
use common::{location, session_cookie};

// ── Public pages ────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let resp = app.get("/health", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn unknown_path_renders_not_found_page() {
    let app = common::spawn_app().await;

    let resp = app.get("/no-such-page", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.text().await.unwrap().contains("404"));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = common::spawn_app().await;

    let resp = app.get("/login", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn index_redirects_logged_in_users_to_dashboard() {
    let app = common::spawn_app().await;
    let session = app.login("admin", "admin123").await;

    let resp = app.get("/", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
}

// ── Login & sessions ────────────────────────────────────────────

#[tokio::test]
async fn dashboard_redirects_to_login_when_unauthenticated() {
    let app = common::spawn_app().await;

    let resp = app.get("/dashboard", None).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn login_redirect_shows_flash_on_login_page() {
    let app = common::spawn_app().await;

    let resp = app.get("/minerals", None).await;
    let flash = resp
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("flash="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("redirect sets a flash cookie");

    let page = app.get("/login", Some(&flash)).await.text().await.unwrap();
    assert!(page.contains("Please log in to access this page."));
}

#[tokio::test]
async fn login_with_valid_credentials_starts_session() {
    let app = common::spawn_app().await;

    let resp = app.post_login("admin", "admin123").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
    let session = session_cookie(&resp).expect("session cookie");

    let page = app.get("/dashboard", Some(&session)).await;
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.text().await.unwrap().contains("Mineral records"));
}

#[tokio::test]
async fn login_username_is_case_insensitive() {
    let app = common::spawn_app().await;

    let resp = app.post_login("Investor1", "investor123").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_with_wrong_password_rerenders_form() {
    let app = common::spawn_app().await;

    let resp = app.post_login("admin", "wrong").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&resp).is_none());
    assert!(resp.text().await.unwrap().contains("Invalid username or password"));
}

#[tokio::test]
async fn login_for_unknown_user_uses_generic_message() {
    let app = common::spawn_app().await;

    let resp = app.post_login("nobody", "whatever").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.text().await.unwrap().contains("Invalid username or password"));
}

#[tokio::test]
async fn repeated_login_failures_are_rate_limited() {
    let app = common::spawn_app().await;

    for _ in 0..5 {
        let resp = app.post_login("admin", "wrong").await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // Blocked even with the right password until the window passes.
    let resp = app.post_login("admin", "admin123").await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // Other accounts are unaffected.
    let resp = app.post_login("investor1", "investor123").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn logout_ends_session() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;

    let resp = app.get("/logout", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let resp = app.get("/dashboard", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn forged_session_cookie_is_rejected() {
    let app = common::spawn_app().await;

    let resp = app.get("/dashboard", Some("session=deadbeef")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
}

// ── Registration ────────────────────────────────────────────────

#[tokio::test]
async fn registered_user_can_log_in_with_chosen_role() {
    let app = common::spawn_app().await;

    let resp = app.register("analyst", "s3cret", "analyst@example.com", "Investor").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let session = app.login("analyst", "s3cret").await;
    let body = app.get("/dashboard", Some(&session)).await.text().await.unwrap();
    assert!(body.contains("analyst (Investor)"));
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = common::spawn_app().await;

    let resp = app.register("ADMIN", "other", "x@example.com", "Researcher").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(resp.text().await.unwrap().contains("Username already exists"));

    let users = common::read_json_array(&app.data_dir.join("users.json"));
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn register_rejects_missing_fields() {
    let app = common::spawn_app().await;

    let resp = app.register("someone", "", "someone@example.com", "Researcher").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_cannot_claim_administrator() {
    let app = common::spawn_app().await;

    let resp = app.register("mallory", "pw", "m@example.com", "Administrator").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.post_login("mallory", "pw").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn closed_registration_is_forbidden() {
    let app = common::spawn_app_with(|c| c.registration = RegistrationMode::Closed).await;

    assert_eq!(app.get("/register", None).await.status(), StatusCode::FORBIDDEN);
    let resp = app.register("late", "pw", "late@example.com", "Researcher").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ── Minerals ────────────────────────────────────────────────────

#[tokio::test]
async fn minerals_list_filters_by_country() {
    let app = common::spawn_app().await;
    let session = app.login("researcher1", "research123").await;

    let body = app.get("/minerals", Some(&session)).await.text().await.unwrap();
    assert!(body.contains("5 record(s)"));

    let body = app
        .get("/minerals?country=DRC", Some(&session))
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("2 record(s)"));
    assert!(body.contains("Copper"));
    assert!(!body.contains("Manganese</td>"));
}

#[tokio::test]
async fn investor_cannot_edit_minerals() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;
    let id = app.mineral_id("Cobalt", "DRC");

    let resp = app.get(&format!("/minerals/{id}/edit"), Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .post_form(&format!("/minerals/{id}/edit"), &session, &[("production_volume", "1")])
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn administrator_edit_persists_record() {
    let app = common::spawn_app().await;
    let session = app.login("admin", "admin123").await;
    let id = app.mineral_id("Copper", "DRC");

    let resp = app.get(&format!("/minerals/{id}/edit"), Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .post_form(
            &format!("/minerals/{id}/edit"),
            &session,
            &[
                ("production_volume", "2500000"),
                ("reserves", "31000000"),
                ("price", "8900"),
                ("uses", "Wiring and motors"),
                ("year", "2023"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/minerals");

    let stored = app
        .stored_minerals()
        .into_iter()
        .find(|r| r["id"] == id.as_str())
        .unwrap();
    assert_eq!(stored["production_volume"], 2_500_000.0);
    assert_eq!(stored["uses"], "Wiring and motors");
    assert_eq!(stored["year"], 2023);
}

#[tokio::test]
async fn edit_rejects_negative_figures() {
    let app = common::spawn_app().await;
    let session = app.login("admin", "admin123").await;
    let id = app.mineral_id("Cobalt", "Zambia");

    let resp = app
        .post_form(
            &format!("/minerals/{id}/edit"),
            &session,
            &[("production_volume", "-5")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn edit_unknown_record_is_not_found() {
    let app = common::spawn_app().await;
    let session = app.login("admin", "admin123").await;

    let resp = app
        .get(&format!("/minerals/{}/edit", uuid::Uuid::new_v4()), Some(&session))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_requires_export_permission() {
    let app = common::spawn_app().await;

    let researcher = app.login("researcher1", "research123").await;
    let resp = app.get("/minerals/export", Some(&researcher)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let investor = app.login("investor1", "investor123").await;
    let resp = app.get("/minerals/export?mineral=Cobalt", Some(&investor)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    let csv = resp.text().await.unwrap();
    assert_eq!(csv.lines().count(), 3, "header plus two cobalt rows");
    assert!(csv.lines().skip(1).all(|line| line.contains("Cobalt")));
}

#[tokio::test]
async fn names_with_slashes_link_to_their_own_page() {
    let sheet = "\
Critical Mineral,Primary African Producing Countries,Key Uses (Criticality)
Niobium/Tantalum,Congo/Brazzaville,Capacitors
";
    let app = common::spawn_app_with_sheet(sheet, |_| {}).await;
    let session = app.login("researcher1", "research123").await;

    let body = app.get("/minerals", Some(&session)).await.text().await.unwrap();
    assert!(body.contains("href=\"/country/Congo%2FBrazzaville\""));

    let resp = app.get("/country/Congo%2FBrazzaville", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Niobium"));

    let body = app.get("/analytics", Some(&session)).await.text().await.unwrap();
    assert!(body.contains("href=\"/analytics/production/Niobium%2FTantalum\""));
    let resp = app
        .get("/analytics/production/Niobium%2FTantalum", Some(&session))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Plotly.newPlot"));
}

// ── Map & countries ─────────────────────────────────────────────

#[tokio::test]
async fn map_page_embeds_markers() {
    let app = common::spawn_app().await;
    let session = app.login("researcher1", "research123").await;

    let resp = app.get("/map?mineral=Cobalt", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("L.map("));
    assert!(body.contains("Cobalt Deposit - DRC"));
    assert!(body.contains("Cobalt Deposit - Zambia"));
    assert!(!body.contains("Copper Deposit - DRC"));
}

#[tokio::test]
async fn country_profile_lists_its_minerals() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;

    let resp = app.get("/country/South%20Africa", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Manganese"));
}

#[tokio::test]
async fn unknown_country_redirects_to_country_list() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;

    let resp = app.get("/country/Atlantis", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/countries");
}

#[tokio::test]
async fn countries_page_lists_every_country() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;

    let body = app.get("/countries", Some(&session)).await.text().await.unwrap();
    for country in ["DRC", "Ghana", "South Africa", "Zambia"] {
        assert!(body.contains(country), "missing {country}");
    }
}

// ── Analytics ───────────────────────────────────────────────────

#[tokio::test]
async fn production_chart_renders_for_known_mineral() {
    let app = common::spawn_app().await;
    let session = app.login("researcher1", "research123").await;

    let resp = app.get("/analytics/production/Cobalt", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Plotly.newPlot"));
}

#[tokio::test]
async fn chart_for_unknown_mineral_shows_notice() {
    let app = common::spawn_app().await;
    let session = app.login("researcher1", "research123").await;

    let resp = app.get("/analytics/market-share/Unobtainium", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("No data available"));
    assert!(!body.contains("Plotly.newPlot"));
}

#[tokio::test]
async fn analytics_overview_pages_render() {
    let app = common::spawn_app().await;
    let session = app.login("admin", "admin123").await;

    for path in ["/analytics", "/analytics/prices", "/analytics/top-producers"] {
        let resp = app.get(path, Some(&session)).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn reserves_comparison_covers_requested_countries() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;

    let body = app.get("/analytics", Some(&session)).await.text().await.unwrap();
    assert!(body.contains("href=\"/analytics/reserves\""));

    let resp = app.get("/analytics/reserves", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Mineral Reserves Comparison"));
    assert!(body.contains("\"barmode\":\"stack\""));

    let resp = app
        .get("/analytics/reserves?countries=Zambia,%20DRC", Some(&session))
        .await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("\"x\":[\"Zambia\",\"DRC\"]"));
    assert!(!body.contains("Ghana"));

    let resp = app
        .get("/analytics/reserves?countries=Atlantis", Some(&session))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("No data available"));
}

#[tokio::test]
async fn report_download_requires_download_permission() {
    let app = common::spawn_app().await;

    let investor = app.login("investor1", "investor123").await;
    let resp = app.get("/analytics/report", Some(&investor)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let researcher = app.login("researcher1", "research123").await;
    let resp = app.get("/analytics/report", Some(&researcher)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report: serde_json::Value = serde_json::from_str(&resp.text().await.unwrap()).unwrap();
    assert!(report.is_object());
}

// ── Admin ───────────────────────────────────────────────────────

#[tokio::test]
async fn error_pages_keep_signed_in_navigation() {
    let app = common::spawn_app().await;
    let session = app.login("investor1", "investor123").await;

    let resp = app.get("/admin/users", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = resp.text().await.unwrap();
    assert!(body.contains("investor1 (Investor)"));
    assert!(body.contains("Log out"));

    let resp = app.get("/no-such-page", Some(&session)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(resp.text().await.unwrap().contains("investor1 (Investor)"));

    let resp = app.get("/no-such-page", None).await;
    let body = resp.text().await.unwrap();
    assert!(body.contains("Log in"));
    assert!(!body.contains("Log out"));
}

#[tokio::test]
async fn user_list_is_admin_only() {
    let app = common::spawn_app().await;

    let investor = app.login("investor1", "investor123").await;
    assert_eq!(
        app.get("/admin/users", Some(&investor)).await.status(),
        StatusCode::FORBIDDEN
    );

    let admin = app.login("admin", "admin123").await;
    let resp = app.get("/admin/users", Some(&admin)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("researcher1"));
    assert!(!body.contains("$argon2"));
}
