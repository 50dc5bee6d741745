//! The tag index.

use qaforum_core::error::CoreError;
use qaforum_core::records::TagCount;

use crate::backend::ForumBackend;

/// Tags in use with their question counts, sorted by name.
pub async fn load_tag_index(backend: &dyn ForumBackend) -> Result<Vec<TagCount>, CoreError> {
    Ok(tag_index(backend.tag_counts().await?))
}

/// Drop unused tags and sort the rest by name.
pub fn tag_index(mut tags: Vec<TagCount>) -> Vec<TagCount> {
    tags.retain(|t| t.question_count > 0);
    tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    tags
}
