use crate::broker::Broker;
use crate::error::broker::BrokerError;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const SET_TEXT: &str = "clipboard.set_text";
const GET_TEXT: &str = "clipboard.get_text";
const CLEAR: &str = "clipboard.clear";
const SET_IMAGE: &str = "clipboard.set_image";
const GET_IMAGE: &str = "clipboard.get_image";

/// Raw image pixels, base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    pub data: String,
}

/// System clipboard, owned by the rendering process.
#[derive(Clone)]
pub struct ClipboardApi {
    broker: Broker,
}

impl ClipboardApi {
    pub fn new(broker: Broker) -> Self {
        Self { broker }
    }

    pub async fn set_text(&self, text: &str) -> Result<(), BrokerError> {
        self.broker.call::<Value>(SET_TEXT, [text], None).await?;
        Ok(())
    }

    pub async fn get_text(&self) -> Result<String, BrokerError> {
        let text: Option<String> = self.broker.call(GET_TEXT, Value::Null, None).await?;
        Ok(text.unwrap_or_default())
    }

    pub async fn clear(&self) -> Result<(), BrokerError> {
        self.broker.call::<Value>(CLEAR, Value::Null, None).await?;
        Ok(())
    }

    /// Returns whether the rendering process accepted the image.
    pub async fn set_image(&self, image: &ClipboardImage) -> Result<bool, BrokerError> {
        let args = (image.width, image.height, image.data.as_str());
        self.broker.call(SET_IMAGE, args, None).await
    }

    pub async fn get_image(&self) -> Result<ClipboardImage, BrokerError> {
        self.broker.call(GET_IMAGE, Value::Null, None).await
    }
}
