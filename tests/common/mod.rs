use std::{collections::HashMap, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use greybook::{
    bootstrap, config::Config, get_random_free_port, init_db, make_router,
    notifications::LogTransport, run_app, AppContext,
};
use envconfig::Envconfig;
use reqwest::{redirect::Policy, Client, Response};
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "owner";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub address: SocketAddr,
    pub upload_path: PathBuf,
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> TestApp {
        let (_, address) = get_random_free_port();
        let run = uuid::Uuid::new_v4();
        let db_path = std::env::temp_dir().join(format!("greybook-it-{}.db", run));
        let upload_path = std::env::temp_dir().join(format!("greybook-it-uploads-{}", run));

        let mut env = HashMap::new();
        env.insert(
            "DATABASE_URL".to_string(),
            format!("sqlite://{}", db_path.display()),
        );
        env.insert("GREYBOOK_BIND".to_string(), address.to_string());
        env.insert("GREYBOOK_ADMIN".to_string(), "Grey Owner".to_string());
        env.insert(
            "GREYBOOK_ADMIN_EMAIL".to_string(),
            "owner@example.com".to_string(),
        );
        env.insert(
            "GREYBOOK_ADMIN_USERNAME".to_string(),
            ADMIN_USERNAME.to_string(),
        );
        env.insert(
            "GREYBOOK_ADMIN_PASSWORD".to_string(),
            ADMIN_PASSWORD.to_string(),
        );
        env.insert(
            "GREYBOOK_UPLOAD_PATH".to_string(),
            upload_path.display().to_string(),
        );
        let config = Config::init_from_hashmap(&env).unwrap();

        let pool = init_db(&config.database_url, config.slow_query_threshold_ms)
            .await
            .unwrap();
        let ctx = AppContext::new(pool, config, Arc::new(LogTransport));
        bootstrap(&ctx).await.unwrap();
        tokio::spawn(run_app(make_router(), address, ctx));

        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();
        let app = TestApp {
            address,
            upload_path,
            client,
        };
        app.wait_until_alive().await;
        app
    }

    async fn wait_until_alive(&self) {
        for _ in 0..50 {
            if let Ok(response) = self.client.get(self.url("/check_health")).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("server at {} never came up", self.address);
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    /// Logs in on a separate client so the caller's session stays anonymous.
    pub async fn admin_client(&self) -> Client {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap();
        let response = client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 303);
        client
    }

    /// Creates a post through the admin API and returns its id.
    pub async fn create_post(&self, admin: &Client, title: &str) -> i64 {
        let response = admin
            .post(self.url("/admin/post/new"))
            .json(&json!({ "post": { "title": title, "body": "<p>hello</p>", "category": 1 } }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 303);
        location(&response)
            .trim_start_matches("/post/")
            .parse()
            .unwrap()
    }
}

pub fn location(response: &Response) -> String {
    response.headers()["location"].to_str().unwrap().to_string()
}

pub fn visitor_comment(body: &str) -> Value {
    json!({
        "comment": {
            "author": "Visitor",
            "email": "visitor@example.com",
            "site": "https://visitor.example.com",
            "body": body,
        }
    })
}
