use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored joke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Joke {
    /// Identifier assigned by the store on first save; `None` until then
    pub id: Option<i64>,
    /// Title of the joke
    pub title: String,
    /// The joke itself
    pub description: String,
    /// Whether the joke is visible in the published listing
    pub published: bool,
}

impl Joke {
    /// A joke that has not been persisted yet.
    pub fn new(title: impl Into<String>, description: impl Into<String>, published: bool) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            published,
        }
    }
}

/// Request body for creating or replacing a joke.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JokePayload {
    /// Title of the joke
    pub title: String,
    /// The joke itself
    pub description: String,
    /// Ignored on create; applied on update
    #[serde(default)]
    pub published: bool,
}

impl JokePayload {
    /// Fresh jokes always start unpublished, whatever the caller sent.
    pub fn into_new_joke(self) -> Joke {
        Joke::new(self.title, self.description, false)
    }

    /// Overwrite every mutable field of `joke`, leaving its id alone.
    pub fn apply_to(self, joke: &mut Joke) {
        joke.title = self.title;
        joke.description = self.description;
        joke.published = self.published;
    }
}
