use dioxus::prelude::*;
use draft_attachments::{data_url_for, FileInfo};

/// Fullscreen viewer for a single image attachment
#[component]
pub fn FullscreenAttachment(file: FileInfo, on_close: EventHandler<()>) -> Element {
    let data_url = use_hook(|| data_url_for(&file));
    let name = file.name.clone();

    rsx! {
        div {
            style: "position: fixed; top: 0; left: 0; right: 0; bottom: 0; background: rgba(0, 0, 0, 0.95); z-index: 1000; display: flex; flex-direction: column;",
            div {
                style: "display: flex; justify-content: space-between; align-items: center; padding: 16px; background: rgba(0, 0, 0, 0.7);",
                div {
                    style: "color: white; font-size: 16px;",
                    "{name}"
                }
                button {
                    style: "width: 40px; height: 40px; background: rgba(255, 255, 255, 0.2); color: white; border-radius: 50%; font-size: 24px; cursor: pointer; border: none;",
                    onclick: move |_| on_close.call(()),
                    "×"
                }
            }
            div {
                style: "flex: 1; display: flex; align-items: center; justify-content: center; padding: 20px;",
                if let Some(url) = data_url {
                    img {
                        src: "{url}",
                        style: "max-width: 100%; max-height: 100%; object-fit: contain;",
                    }
                } else {
                    div {
                        style: "color: white; font-size: 48px;",
                        "📷"
                    }
                }
            }
        }
    }
}
