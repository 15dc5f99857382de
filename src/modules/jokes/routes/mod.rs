use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use jokes_http::error::AppError;
use serde::Deserialize;

use super::models::{Joke, JokePayload};
use super::store::JokeStore;

type SharedStore = Arc<dyn JokeStore>;

/// Query string accepted by the list endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub title: Option<String>,
}

/// HTTP routes for the jokes module, relative to its mount point.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(
            "/",
            get(list_jokes).post(create_joke).delete(delete_all_jokes),
        )
        .route("/published", get(list_published_jokes))
        .route(
            "/{id}",
            get(get_joke).put(update_joke).delete(delete_joke),
        )
        .with_state(store)
}

/// 200 with the list, or 204 when there is nothing to show
fn list_response(jokes: Vec<Joke>) -> Response {
    if jokes.is_empty() {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::OK, Json(jokes)).into_response()
    }
}

async fn list_jokes(
    State(store): State<SharedStore>,
    Query(params): Query<ListParams>,
) -> Result<Response, AppError> {
    let jokes = match params.title.as_deref() {
        None => store.find_all().await?,
        Some(title) => store.find_by_title_containing(title).await?,
    };

    tracing::debug!(count = jokes.len(), title = ?params.title, "listed jokes");
    Ok(list_response(jokes))
}

async fn list_published_jokes(State(store): State<SharedStore>) -> Result<Response, AppError> {
    let jokes = store.find_by_published(true).await?;
    Ok(list_response(jokes))
}

async fn get_joke(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<Json<Joke>, AppError> {
    store
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("joke {id}")))
}

async fn create_joke(
    State(store): State<SharedStore>,
    Json(payload): Json<JokePayload>,
) -> Result<(StatusCode, Json<Joke>), AppError> {
    let joke = store.save(payload.into_new_joke()).await?;

    tracing::info!(id = ?joke.id, "joke created");
    Ok((StatusCode::CREATED, Json(joke)))
}

async fn update_joke(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
    Json(payload): Json<JokePayload>,
) -> Result<Json<Joke>, AppError> {
    // Read-then-write without a transaction; last writer wins.
    let mut joke = store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("joke {id}")))?;

    payload.apply_to(&mut joke);
    let joke = store.save(joke).await?;

    tracing::info!(id, "joke updated");
    Ok(Json(joke))
}

async fn delete_joke(
    State(store): State<SharedStore>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    store.delete_by_id(id).await?;

    tracing::info!(id, "joke deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_all_jokes(State(store): State<SharedStore>) -> Result<StatusCode, AppError> {
    store.delete_all().await?;

    tracing::info!("all jokes deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::jokes::store::{StoreError, StoreResult};
    use crate::modules::jokes::test_support::memory_store;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Store whose every call fails, counting writes that were attempted.
    #[derive(Default)]
    struct BrokenStore {
        writes: AtomicUsize,
    }

    fn broken() -> StoreError {
        StoreError::Storage(sqlx::Error::PoolClosed)
    }

    #[async_trait]
    impl JokeStore for BrokenStore {
        async fn find_all(&self) -> StoreResult<Vec<Joke>> {
            Err(broken())
        }

        async fn find_by_id(&self, _id: i64) -> StoreResult<Option<Joke>> {
            Err(broken())
        }

        async fn find_by_published(&self, _published: bool) -> StoreResult<Vec<Joke>> {
            Err(broken())
        }

        async fn find_by_title_containing(&self, _needle: &str) -> StoreResult<Vec<Joke>> {
            Err(broken())
        }

        async fn save(&self, _joke: Joke) -> StoreResult<Joke> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(broken())
        }

        async fn delete_by_id(&self, _id: i64) -> StoreResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(broken())
        }

        async fn delete_all(&self) -> StoreResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(broken())
        }
    }

    async fn app() -> (Router, Arc<dyn JokeStore>) {
        let store: Arc<dyn JokeStore> = Arc::new(memory_store().await);
        (router(store.clone()), store)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed(store: &Arc<dyn JokeStore>, titles: &[&str], published: bool) -> Vec<Joke> {
        let mut saved = Vec::new();
        for title in titles {
            saved.push(
                store
                    .save(Joke::new(*title, "Description", published))
                    .await
                    .unwrap(),
            );
        }
        saved
    }

    #[tokio::test]
    async fn create_forces_unpublished() {
        let (router, _) = app().await;

        let response = send(
            &router,
            Method::POST,
            "/",
            Some(json!({"title": "Joke @test", "description": "Joke description", "published": true})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        assert!(body["id"].is_i64());
        assert_eq!(body["title"], "Joke @test");
        assert_eq!(body["description"], "Joke description");
        assert_eq!(body["published"], false);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let (router, store) = app().await;

        let response = send(&router, Method::POST, "/", Some(json!({"title": "only"}))).await;

        assert!(response.status().is_client_error());
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_returns_joke() {
        let (router, store) = app().await;
        let jokes = seed(&store, &["Joke @test"], true).await;
        let id = jokes[0].id.unwrap();

        let response = send(&router, Method::GET, &format!("/{id}"), None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["id"], id);
        assert_eq!(body["title"], "Joke @test");
        assert_eq!(body["description"], "Description");
        assert_eq!(body["published"], true);
    }

    #[tokio::test]
    async fn get_unknown_id_is_404() {
        let (router, _) = app().await;

        let response = send(&router, Method::GET, "/1", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_non_numeric_id_is_rejected() {
        let (router, _) = app().await;

        let response = send(&router, Method::GET, "/abc", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_returns_all_jokes() {
        let (router, store) = app().await;
        seed(&store, &["Web 1", "Web 2", "Web 3"], true).await;

        let response = send(&router, Method::GET, "/", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn list_empty_is_204() {
        let (router, _) = app().await;

        let response = send(&router, Method::GET, "/", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn list_filters_by_title() {
        let (router, store) = app().await;
        seed(
            &store,
            &["Spring Boot test", "Axum handlers", "Spring Boot Web MVC"],
            true,
        )
        .await;

        let response = send(&router, Method::GET, "/?title=Boot", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let titles: Vec<String> = read_json(response)
            .await
            .as_array()
            .unwrap()
            .iter()
            .map(|j| j["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Spring Boot test", "Spring Boot Web MVC"]);

        let response = send(&router, Method::GET, "/?title=Patrick", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&router, Method::GET, "/?title=boot", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn list_with_empty_title_returns_all() {
        let (router, store) = app().await;
        seed(&store, &["a", "b"], false).await;

        let response = send(&router, Method::GET, "/?title=", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_published_only_returns_published() {
        let (router, store) = app().await;
        seed(&store, &["draft"], false).await;

        let response = send(&router, Method::GET, "/published", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        seed(&store, &["live 1", "live 2"], true).await;
        let response = send(&router, Method::GET, "/published", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let jokes = body.as_array().unwrap();
        assert_eq!(jokes.len(), 2);
        assert!(jokes.iter().all(|j| j["published"] == true));
    }

    #[tokio::test]
    async fn update_overwrites_fields() {
        let (router, store) = app().await;
        let jokes = seed(&store, &["Original"], false).await;
        let id = jokes[0].id.unwrap();

        let response = send(
            &router,
            Method::PUT,
            &format!("/{id}"),
            Some(json!({"id": 777, "title": "Updated", "description": "Updated", "published": true})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["id"], id);
        assert_eq!(body["title"], "Updated");
        assert_eq!(body["description"], "Updated");
        assert_eq!(body["published"], true);

        let stored = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Updated");
        assert!(store.find_by_id(777).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unknown_id_is_404_without_write() {
        let (router, store) = app().await;

        let response = send(
            &router,
            Method::PUT,
            "/1",
            Some(json!({"title": "Updated", "description": "Updated", "published": true})),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_only_that_joke() {
        let (router, store) = app().await;
        let jokes = seed(&store, &["one", "two", "three"], true).await;

        let response = send(
            &router,
            Method::DELETE,
            &format!("/{}", jokes[1].id.unwrap()),
            None,
        )
        .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let remaining = store.find_all().await.unwrap();
        assert_eq!(remaining, vec![jokes[0].clone(), jokes[2].clone()]);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_204() {
        let (router, _) = app().await;

        let response = send(&router, Method::DELETE, "/42", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn delete_all_empties_store() {
        let (router, store) = app().await;
        seed(&store, &["one", "two"], true).await;

        let response = send(&router, Method::DELETE, "/", None).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn storage_failures_are_500_with_empty_body() {
        let store = Arc::new(BrokenStore::default());
        let router = router(store.clone());
        let payload = json!({"title": "t", "description": "d", "published": false});

        let cases = [
            (Method::GET, "/", None),
            (Method::GET, "/?title=x", None),
            (Method::GET, "/published", None),
            (Method::GET, "/1", None),
            (Method::POST, "/", Some(payload.clone())),
            (Method::PUT, "/1", Some(payload)),
            (Method::DELETE, "/1", None),
            (Method::DELETE, "/", None),
        ];

        for (method, uri, body) in cases {
            let response = send(&router, method.clone(), uri, body).await;
            assert_eq!(
                response.status(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "{method} {uri}"
            );
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert!(bytes.is_empty(), "{method} {uri}");
        }

        // PUT fails on the lookup, before any write
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
    }
}
