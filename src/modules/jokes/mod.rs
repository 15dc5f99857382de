pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use jokes_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::PartialSchema;

use models::{Joke, JokePayload};
use store::{JokeStore, SqlJokeStore};

const CREATE_JOKES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS jokes (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL,
        description TEXT NOT NULL,
        published   BOOLEAN NOT NULL DEFAULT 0
    );
    CREATE INDEX IF NOT EXISTS jokes_published_idx ON jokes (published);
"#;

fn schema_migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_create_jokes",
        up: CREATE_JOKES_TABLE,
    }]
}

/// Jokes module: CRUD over the `jokes` table
pub struct JokesModule {
    store: Arc<dyn JokeStore>,
}

impl JokesModule {
    pub fn new(store: Arc<dyn JokeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for JokesModule {
    fn name(&self) -> &'static str {
        "jokes"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let existing = self.store.find_all().await?.len();
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            existing,
            "jokes module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let joke_schema = serde_json::to_value(Joke::schema()).ok()?;
        let payload_schema = serde_json::to_value(JokePayload::schema()).ok()?;

        let joke = json!({ "$ref": "#/components/schemas/Joke" });
        let joke_list = json!({ "type": "array", "items": joke });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });
        let payload_body = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/JokePayload" }
                }
            }
        });
        let json_of = |schema: &serde_json::Value, description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": schema } }
            })
        };
        let bare = |description: &str| json!({ "description": description });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List jokes, optionally filtered by title substring",
                        "tags": ["Jokes"],
                        "parameters": [{
                            "name": "title",
                            "in": "query",
                            "required": false,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": json_of(&joke_list, "Matching jokes"),
                            "204": bare("No joke matched"),
                            "500": bare("Storage failure")
                        }
                    },
                    "post": {
                        "summary": "Create an unpublished joke",
                        "tags": ["Jokes"],
                        "requestBody": payload_body.clone(),
                        "responses": {
                            "201": json_of(&joke, "Created joke"),
                            "500": bare("Storage failure")
                        }
                    },
                    "delete": {
                        "summary": "Delete every joke",
                        "tags": ["Jokes"],
                        "responses": {
                            "204": bare("All jokes deleted"),
                            "500": bare("Storage failure")
                        }
                    }
                },
                "/published": {
                    "get": {
                        "summary": "List published jokes",
                        "tags": ["Jokes"],
                        "responses": {
                            "200": json_of(&joke_list, "Published jokes"),
                            "204": bare("Nothing published"),
                            "500": bare("Storage failure")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch one joke",
                        "tags": ["Jokes"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": json_of(&joke, "The joke"),
                            "404": bare("Unknown id"),
                            "500": bare("Storage failure")
                        }
                    },
                    "put": {
                        "summary": "Replace title, description and published flag",
                        "tags": ["Jokes"],
                        "parameters": [id_param.clone()],
                        "requestBody": payload_body,
                        "responses": {
                            "200": json_of(&joke, "Updated joke"),
                            "404": bare("Unknown id"),
                            "500": bare("Storage failure")
                        }
                    },
                    "delete": {
                        "summary": "Delete one joke",
                        "tags": ["Jokes"],
                        "parameters": [id_param],
                        "responses": {
                            "204": bare("Deleted, or never existed"),
                            "500": bare("Storage failure")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Joke": joke_schema,
                    "JokePayload": payload_schema
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        schema_migrations()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "jokes module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "jokes module stopped");
        Ok(())
    }
}

/// Create the jokes module backed by the given pool
pub fn create_module(pool: SqlitePool) -> Arc<dyn Module> {
    Arc::new(JokesModule::new(Arc::new(SqlJokeStore::new(pool))))
}


#[cfg(test)]
mod tests {
    use super::*;
    use jokes_kernel::settings::Settings;

    #[tokio::test]
    async fn module_contract() {
        let store = test_support::memory_store().await;
        let module = JokesModule::new(Arc::new(store));
        let settings = Settings::default();

        assert_eq!(module.name(), "jokes");
        assert_eq!(module.migrations().len(), 1);
        module.init(&InitCtx { settings: &settings }).await.unwrap();
    }

    #[tokio::test]
    async fn openapi_fragment_describes_every_route() {
        let module = JokesModule::new(Arc::new(test_support::memory_store().await));
        let spec = module.openapi().unwrap();

        for (path, method) in [
            ("/", "get"),
            ("/", "post"),
            ("/", "delete"),
            ("/published", "get"),
            ("/{id}", "get"),
            ("/{id}", "put"),
            ("/{id}", "delete"),
        ] {
            assert!(spec["paths"][path][method].is_object(), "{method} {path}");
        }
        assert!(spec["components"]["schemas"]["Joke"]["properties"]["title"].is_object());
    }
}
