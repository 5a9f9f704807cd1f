use crate::broker::Broker;
use crate::error::broker::BrokerError;

use serde_json::Value;

#[derive(Clone)]
pub struct WebViewApi {
    broker: Broker,
}

impl WebViewApi {
    pub fn new(broker: Broker) -> Self {
        Self { broker }
    }

    pub async fn is_devtools_open(&self) -> Result<bool, BrokerError> {
        self.broker
            .call("webview.isDevtoolsOpen", Value::Null, None)
            .await
    }

    pub async fn open_devtools(&self) -> Result<bool, BrokerError> {
        self.broker
            .call("webview.openDevtools", Value::Null, None)
            .await
    }

    pub async fn close_devtools(&self) -> Result<bool, BrokerError> {
        self.broker
            .call("webview.closeDevtools", Value::Null, None)
            .await
    }
}
