use crate::config::Settings;
use crate::dom::{Document, NodeId};

/// Product image switcher: a main image and the thumbnails that replace it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gallery {
    pub main_image: Option<NodeId>,
    pub thumbnails: Vec<NodeId>,
}

impl Gallery {
    pub fn discover(doc: &Document, settings: &Settings) -> Self {
        Self {
            main_image: doc.select(&settings.markers.main_image),
            thumbnails: doc.select_all(&settings.markers.thumbnails),
        }
    }

    /// Show `thumbnail` in the main image and make it the only active
    /// thumbnail. Without a main image only the active marker moves.
    pub fn select(&self, doc: &mut Document, settings: &Settings, thumbnail: NodeId) {
        let active = &settings.config.gallery.active_class;
        match self.main_image {
            Some(main) => {
                let src = doc.attr(thumbnail, "src").unwrap_or_default().to_string();
                doc.set_attr(main, "src", src);
            }
            None => tracing::debug!("gallery has no main image"),
        }
        for thumb in &self.thumbnails {
            doc.remove_class(*thumb, active);
        }
        doc.add_class(thumbnail, active);
    }
}
