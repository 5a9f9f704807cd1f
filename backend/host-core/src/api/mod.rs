//! Built-in commands exposed to frontends.
//!
//! Most of them forward to the rendering process through the broker; the
//! facades here give those calls typed signatures.

pub mod clipboard;
pub mod host;
pub mod webview;
pub mod window;

pub use clipboard::{ClipboardApi, ClipboardImage};
pub use webview::WebViewApi;
pub use window::WindowApi;

use crate::broker::Broker;
use crate::error::handler::HandlerError;
use crate::error::registry::RegistryError;
use crate::registry::CommandRegistry;

/// Register every built-in command on `registry`, routing native calls via `broker`.
pub fn register_builtin_commands(
    registry: &mut CommandRegistry,
    broker: &Broker,
) -> Result<(), RegistryError> {
    let clipboard = ClipboardApi::new(broker.clone());
    let webview = WebViewApi::new(broker.clone());
    let window = WindowApi::new(broker.clone());

    registry.register_sync("home_dir", |(): ()| host::home_dir())?;

    let api = clipboard.clone();
    registry.register("set_text", move |text: String| {
        let api = api.clone();
        async move { api.set_text(&text).await.map_err(HandlerError::from) }
    })?;

    let api = clipboard.clone();
    registry.register("get_text", move |(): ()| {
        let api = api.clone();
        async move { api.get_text().await.map_err(HandlerError::from) }
    })?;

    let api = clipboard.clone();
    registry.register("clear", move |(): ()| {
        let api = api.clone();
        async move { api.clear().await.map_err(HandlerError::from) }
    })?;

    let api = clipboard.clone();
    registry.register("set_image", move |image: ClipboardImage| {
        let api = api.clone();
        async move { api.set_image(&image).await.map_err(HandlerError::from) }
    })?;

    let api = clipboard;
    registry.register("get_image", move |(): ()| {
        let api = api.clone();
        async move { api.get_image().await.map_err(HandlerError::from) }
    })?;

    let api = webview.clone();
    registry.register("open_devtools", move |(): ()| {
        let api = api.clone();
        async move { api.open_devtools().await.map_err(HandlerError::from) }
    })?;

    let api = webview.clone();
    registry.register("close_devtools", move |(): ()| {
        let api = api.clone();
        async move { api.close_devtools().await.map_err(HandlerError::from) }
    })?;

    let api = webview;
    registry.register("is_devtools_open", move |(): ()| {
        let api = api.clone();
        async move { api.is_devtools_open().await.map_err(HandlerError::from) }
    })?;

    let api = window.clone();
    registry.register("set_title", move |title: String| {
        let api = api.clone();
        async move { api.set_title(&title).await.map_err(HandlerError::from) }
    })?;

    let api = window.clone();
    registry.register("get_title", move |(): ()| {
        let api = api.clone();
        async move { api.get_title().await.map_err(HandlerError::from) }
    })?;

    let api = window;
    registry.register("set_fullscreen", move |fullscreen: bool| {
        let api = api.clone();
        async move { api.set_fullscreen(fullscreen).await.map_err(HandlerError::from) }
    })?;

    Ok(())
}
