use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

use chrono_minerals::config::{Config, RegistrationMode};

/// Spreadsheet fixture: five mineral records across four rows, one of them
/// listing two countries.
pub const FIXTURE_CSV: &str = "\
Critical Mineral,Primary African Producing Countries,Key Uses (Criticality)
Cobalt,DRC,Batteries and superalloys
Cobalt,Zambia,Batteries and superalloys
Manganese,\"South Africa, Ghana (minor)\",Steel production
Copper,DRC,Electrical wiring
";

/// A running server over its own temporary data directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub data_dir: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log in through the form and return the `session=...` cookie pair.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let resp = self.post_login(username, password).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login failed for {username}");
        session_cookie(&resp).expect("login response carries no session cookie")
    }

    pub async fn post_login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("login request failed")
    }

    pub async fn register(&self, username: &str, password: &str, email: &str, role: &str) -> Response {
        self.client
            .post(self.url("/register"))
            .form(&[
                ("username", username),
                ("password", password),
                ("email", email),
                ("role", role),
            ])
            .send()
            .await
            .expect("register request failed")
    }

    /// GET with an optional session cookie.
    pub async fn get(&self, path: &str, session: Option<&str>) -> Response {
        let mut req = self.client.get(self.url(path));
        if let Some(cookie) = session {
            req = req.header(COOKIE, cookie);
        }
        req.send().await.expect("get request failed")
    }

    pub async fn post_form(&self, path: &str, session: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header(COOKIE, session)
            .form(form)
            .send()
            .await
            .expect("post request failed")
    }

    /// Mineral records as persisted in `minerals.json`.
    pub fn stored_minerals(&self) -> Vec<Value> {
        read_json_array(&self.data_dir.join("minerals.json"))
    }

    /// Id of the first stored record for `mineral` in `country`.
    pub fn mineral_id(&self, mineral: &str, country: &str) -> String {
        self.stored_minerals()
            .into_iter()
            .find(|r| r["mineral_name"] == mineral && r["country"] == country)
            .and_then(|r| r["id"].as_str().map(str::to_string))
            .unwrap_or_else(|| panic!("no {mineral} record for {country}"))
    }
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: dir.join("data"),
        spreadsheet: dir.join("minerals.csv"),
        sheet_name: "Sheet1".to_string(),
        session_hours: 2,
        registration: RegistrationMode::Open,
        seed_users: true,
        secure_cookies: false,
        log_level: "warn".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn a server after letting the caller adjust the configuration.
pub async fn spawn_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    spawn_app_with_sheet(FIXTURE_CSV, adjust).await
}

/// Spawn a server whose records come from the given CSV text.
pub async fn spawn_app_with_sheet(csv: &str, adjust: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(dir.path().join("minerals.csv"), csv).unwrap();

    let mut config = test_config(dir.path());
    adjust(&mut config);
    let data_dir = config.data_dir.clone();

    let state = chrono_minerals::load_state(config)
        .await
        .expect("failed to load state");
    let app = chrono_minerals::build_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        data_dir,
        _dir: dir,
    }
}

pub fn session_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session=") && !v.starts_with("session=;"))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn read_json_array(path: &Path) -> Vec<Value> {
    let raw = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&raw).unwrap()
}
