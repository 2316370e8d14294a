//! Resolve CMS image references to CDN URLs.
//!
//! Asset references encode everything needed for the URL:
//! `image-<asset id>-<width>x<height>-<format>` maps to
//! `https://cdn.sanity.io/images/<project>/<dataset>/<asset id>-<width>x<height>.<format>`.

use serde::{Deserialize, Serialize};

use crate::types::ImageRef;

const CDN_BASE: &str = "https://cdn.sanity.io/images";

/// Builds public image URLs for one CMS project and dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    /// Create a builder for the given project and dataset.
    #[must_use]
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// Whether both project and dataset are set. Without them no URL is built.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.project_id.trim().is_empty() && !self.dataset.trim().is_empty()
    }

    /// URL of the referenced image, or `None` if the reference is malformed or
    /// the builder has no project.
    #[must_use]
    pub fn url_for(&self, image: &ImageRef) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        let rest = image.asset.reference.strip_prefix("image-")?;
        let (id_and_size, format) = rest.rsplit_once('-')?;
        let (id, size) = id_and_size.rsplit_once('-')?;

        let (width, height) = size.split_once('x')?;
        let is_dimension = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if id.is_empty() || format.is_empty() || !is_dimension(width) || !is_dimension(height) {
            return None;
        }

        Some(format!(
            "{CDN_BASE}/{}/{}/{id}-{size}.{format}",
            self.project_id, self.dataset
        ))
    }

    /// URL of the first resolvable image in a list.
    #[must_use]
    pub fn first_url(&self, images: &[ImageRef]) -> Option<String> {
        images.iter().find_map(|image| self.url_for(image))
    }
}
