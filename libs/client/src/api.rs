//! Typed HTTP binding to the Zimmet API service
//!
//! Thin wrappers over reqwest: one generic helper per verb plus a typed
//! method per endpoint. The [`Directory`] trait is the subset the
//! reconciliation engine consumes; it is implemented here over HTTP and
//! by an in-memory double in the engine's tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use common::models::{
    Asset, Assignment, AssignmentFilter, AssignmentRow, Category, CreateAssetRequest,
    CreateAssignmentRequest, CreateCategoryRequest, CreateUserRequest, LoginRequest,
    LoginResponse, UpdateAssetRequest, UpdateAssignmentRequest, UpdateUserRequest, User,
};

use crate::error::{ClientError, ClientResult};

/// The API surface the reconciliation engine depends on
#[async_trait]
pub trait Directory {
    async fn list_users(&self) -> ClientResult<Vec<User>>;
    async fn list_assets(&self) -> ClientResult<Vec<Asset>>;
    async fn list_assignments(&self) -> ClientResult<Vec<AssignmentRow>>;
    async fn create_user(&self, payload: CreateUserRequest) -> ClientResult<User>;
    async fn create_asset(&self, payload: CreateAssetRequest) -> ClientResult<Asset>;
    async fn create_assignment(&self, payload: CreateAssignmentRequest)
    -> ClientResult<Assignment>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct OkBody {
    ok: bool,
}

/// Typed client for the Zimmet API service
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new client against the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Create a client from the `ZIMMET_API_URL` environment variable
    pub fn from_env() -> Self {
        let base_url = std::env::var("ZIMMET_API_URL")
            .unwrap_or_else(|_| "http://localhost:4000".to_string());
        Self::new(base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let code = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => "unknown".to_string(),
        };

        Err(ClientError::Api {
            status: status.as_u16(),
            code,
        })
    }

    /// GET a JSON resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    /// GET a JSON resource with query parameters
    pub async fn get_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self.http.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }

    /// POST a JSON body, returning the created resource
    pub async fn post<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// PUT a JSON body, returning the updated resource
    pub async fn put<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.http.put(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let response = self.http.delete(self.url(path)).send().await?;
        Self::decode::<OkBody>(response).await?;
        Ok(())
    }

    /// Verify credentials, returning the session token and user
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        self.post(
            "/auth/login",
            &LoginRequest {
                email: Some(email.to_string()),
                password: Some(password.to_string()),
            },
        )
        .await
    }

    /// Update the provided fields of a user
    pub async fn update_user(&self, id: Uuid, payload: &UpdateUserRequest) -> ClientResult<User> {
        self.put(&format!("/users/{id}"), payload).await
    }

    /// Delete a user and, cascading, its assignments
    pub async fn delete_user(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/users/{id}")).await
    }

    /// Update the provided fields of an asset
    pub async fn update_asset(
        &self,
        id: Uuid,
        payload: &UpdateAssetRequest,
    ) -> ClientResult<Asset> {
        self.put(&format!("/assets/{id}"), payload).await
    }

    /// Delete an asset and, cascading, its assignments
    pub async fn delete_asset(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/assets/{id}")).await
    }

    /// List all categories
    pub async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        self.get("/categories").await
    }

    /// Create a new category
    pub async fn create_category(&self, name: &str) -> ClientResult<Category> {
        self.post(
            "/categories",
            &CreateCategoryRequest {
                name: Some(name.to_string()),
            },
        )
        .await
    }

    /// Delete a category
    pub async fn delete_category(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/categories/{id}")).await
    }

    /// List assignments matching the filter, joined with user and asset
    pub async fn list_assignments_with(
        &self,
        filter: &AssignmentFilter,
    ) -> ClientResult<Vec<AssignmentRow>> {
        self.get_query("/assignments", filter).await
    }

    /// Get a single joined assignment
    pub async fn get_assignment(&self, id: Uuid) -> ClientResult<AssignmentRow> {
        self.get(&format!("/assignments/{id}")).await
    }

    /// Update the provided fields of an assignment
    pub async fn update_assignment(
        &self,
        id: Uuid,
        payload: &UpdateAssignmentRequest,
    ) -> ClientResult<Assignment> {
        self.put(&format!("/assignments/{id}"), payload).await
    }

    /// Delete an assignment
    pub async fn delete_assignment(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/assignments/{id}")).await
    }
}

#[async_trait]
impl Directory for ApiClient {
    async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.get("/users").await
    }

    async fn list_assets(&self) -> ClientResult<Vec<Asset>> {
        self.get("/assets").await
    }

    async fn list_assignments(&self) -> ClientResult<Vec<AssignmentRow>> {
        self.list_assignments_with(&AssignmentFilter::default())
            .await
    }

    async fn create_user(&self, payload: CreateUserRequest) -> ClientResult<User> {
        self.post("/users", &payload).await
    }

    async fn create_asset(&self, payload: CreateAssetRequest) -> ClientResult<Asset> {
        self.post("/assets", &payload).await
    }

    async fn create_assignment(
        &self,
        payload: CreateAssignmentRequest,
    ) -> ClientResult<Assignment> {
        self.post("/assignments", &payload).await
    }
}
