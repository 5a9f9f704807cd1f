use crate::broker::Broker;
use crate::error::broker::BrokerError;

use serde_json::Value;

#[derive(Clone)]
pub struct WindowApi {
    broker: Broker,
}

impl WindowApi {
    pub fn new(broker: Broker) -> Self {
        Self { broker }
    }

    pub async fn set_title(&self, title: &str) -> Result<(), BrokerError> {
        self.broker
            .call::<Value>("window.setTitle", [title], None)
            .await?;
        Ok(())
    }

    pub async fn get_title(&self) -> Result<String, BrokerError> {
        self.broker.call("window.getTitle", Value::Null, None).await
    }

    pub async fn set_fullscreen(&self, fullscreen: bool) -> Result<(), BrokerError> {
        self.broker
            .call::<Value>("window.setFullscreen", [fullscreen], None)
            .await?;
        Ok(())
    }
}
