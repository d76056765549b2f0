use std::sync::Arc;

use crate::application::catalog::CatalogService;
use crate::application::comments::CommentService;
use crate::application::repos::CommentsRepo;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub comments: Arc<CommentService>,
    /// Backing store probed by the health check.
    pub db: Arc<dyn CommentsRepo>,
}
