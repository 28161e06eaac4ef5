use std::sync::Arc;

use shared::{
    domain::NewsId,
    protocol::{NewsArticle, NewsDraft},
};

use super::{collection_path, item_path, Resource, ResourceService};
use crate::{
    envelope::unwrap_one,
    error::ClientResult,
    transport::{ApiRequest, FormPart, FormValue, Method, Transport},
};

pub const IMAGE_FIELD: &str = "image";
pub const REMOVE_IMAGE_FIELD: &str = "removeImage";

pub struct NewsArticles;

impl Resource for NewsArticles {
    const PATH: &'static str = "news";
    type Record = NewsArticle;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// What an edit does to the stored image. `Unchanged` sends no image field,
/// `Cleared` sends an explicit removal flag, `Replaced` uploads a new file.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageUpdate {
    #[default]
    Unchanged,
    Cleared,
    Replaced(ImageFile),
}

#[derive(Clone)]
pub struct NewsService {
    transport: Arc<dyn Transport>,
    inner: ResourceService<NewsArticles>,
}

impl NewsService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: ResourceService::new(Arc::clone(&transport)),
            transport,
        }
    }

    pub async fn list(&self) -> ClientResult<Vec<NewsArticle>> {
        self.inner.list(&[]).await
    }

    pub async fn create(
        &self,
        draft: &NewsDraft,
        image: Option<ImageFile>,
    ) -> ClientResult<NewsArticle> {
        draft.validate()?;
        let update = image.map_or(ImageUpdate::Unchanged, ImageUpdate::Replaced);
        let body = self
            .transport
            .execute(ApiRequest::multipart(
                Method::Post,
                collection_path(NewsArticles::PATH),
                form_parts(draft, update),
            ))
            .await?;
        unwrap_one(body)
    }

    pub async fn update(
        &self,
        id: &NewsId,
        draft: &NewsDraft,
        image: ImageUpdate,
    ) -> ClientResult<NewsArticle> {
        draft.validate()?;
        let body = self
            .transport
            .execute(ApiRequest::multipart(
                Method::Put,
                item_path(NewsArticles::PATH, id),
                form_parts(draft, image),
            ))
            .await?;
        unwrap_one(body)
    }

    pub async fn delete(&self, id: &NewsId) -> ClientResult<()> {
        self.inner.delete(id).await
    }
}

pub(crate) fn form_parts(draft: &NewsDraft, image: ImageUpdate) -> Vec<FormPart> {
    let mut parts = vec![
        FormPart::text("title", draft.title.clone()),
        FormPart::text("content", draft.content.clone()),
        FormPart::text("published", draft.published.to_string()),
    ];
    match image {
        ImageUpdate::Unchanged => {}
        ImageUpdate::Cleared => parts.push(FormPart::text(REMOVE_IMAGE_FIELD, "true")),
        ImageUpdate::Replaced(file) => parts.push(FormPart {
            name: IMAGE_FIELD.to_string(),
            value: FormValue::File {
                filename: file.filename,
                mime_type: file.mime_type,
                bytes: file.bytes,
            },
        }),
    }
    parts
}
