//! Rich embeds.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A rich embed attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Embed {
    /// Title line.
    pub title: Option<String>,
    /// Body text.
    pub description: Option<String>,
    /// Sidebar colour as `0xRRGGBB`.
    pub color: Option<u32>,
    /// Large image URL.
    pub image: Option<String>,
}

impl Embed {
    /// An embed with just a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Set the description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Set the colour.
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the image, ignoring empty URLs.
    pub fn image(mut self, url: Option<String>) -> Self {
        self.image = url.filter(|u| !u.trim().is_empty());
        self
    }
}

impl Serialize for Embed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Image<'a> {
            url: &'a str,
        }

        let mut map = serializer.serialize_map(None)?;
        if let Some(title) = &self.title {
            map.serialize_entry("title", title)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        if let Some(color) = self.color {
            map.serialize_entry("color", &color)?;
        }
        if let Some(url) = &self.image {
            map.serialize_entry("image", &Image { url })?;
        }
        map.end()
    }
}
