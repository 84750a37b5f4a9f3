use std::sync::Arc;

use auth::Authenticator;
use auth::HashCost;
use identity_service::config::Environment;
use identity_service::domain::identity::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemoryIdentityRepository;
use serde_json::json;
use serde_json::Value;

pub const SIGNING_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub repository: Arc<InMemoryIdentityRepository>,
    pub authenticator: Arc<Authenticator>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in the test environment
    pub async fn spawn() -> Self {
        Self::spawn_in(Environment::Test).await
    }

    /// Spawn the application in a background task and return TestApp
    pub async fn spawn_in(environment: Environment) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        // Cheap hashing keeps the suite fast; the algorithm is unchanged
        let authenticator = Arc::new(
            Authenticator::with_cost(
                SIGNING_SECRET,
                HashCost {
                    memory_kib: 1024,
                    iterations: 1,
                    parallelism: 1,
                },
            )
            .expect("Failed to create authenticator"),
        );

        let repository = Arc::new(InMemoryIdentityRepository::new());
        let identity_service = Arc::new(IdentityService::new(
            Arc::clone(&repository),
            Arc::clone(&authenticator),
            chrono::Duration::minutes(60),
        ));

        let router = create_router(identity_service, environment);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            repository,
            authenticator,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register an identity and return the response
    pub async fn register(&self, name: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/register")
            .json(&json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the response
    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register the default test identity and return its token
    pub async fn register_default(&self) -> (Value, String) {
        let response = self
            .register("John Doe", "john@example.com", "SecurePass123!")
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.expect("Failed to parse response");
        let token = body["token"].as_str().expect("token missing").to_string();
        (body["user"].clone(), token)
    }
}
