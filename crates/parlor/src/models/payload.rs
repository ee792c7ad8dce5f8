use serde::{Deserialize, Serialize};

/// One card in a carousel reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselItem {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub actions: Vec<CarouselAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarouselAction {
    pub label: String,
    pub url: String,
}

/// Content of a canonical message.
///
/// Serializes to the `{"type": ..., "content": ...}` shape the widget
/// renders: a string for text and image payloads, the card list for
/// carousels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    Image(String),
    Carousel(Vec<CarouselItem>),
}
