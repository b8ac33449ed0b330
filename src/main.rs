use std::sync::Arc;

use dioxus::prelude::*;

mod components;
mod database;
mod error;
mod models;
mod services;

use components::{ChannelScreen, NavigationBar, SettingsScreen};
use draft_attachments::{EditPostContext, UploadContext, UploadManager, UploadManagerConfig};
use services::draft_service::SqliteDraftStore;
use services::settings_service;

fn main() {
    init_logging();
    dioxus::launch(App);
}

fn init_logging() {
    #[cfg(target_os = "android")]
    android_logger::init_once(
        android_logger::Config::default().with_max_level(log::LevelFilter::Info),
    );

    #[cfg(not(target_os = "android"))]
    env_logger::init();
}

/// Screen navigation for the app
#[derive(Clone, PartialEq, Debug)]
pub enum Screen {
    Channel,
    Settings,
}

#[component]
fn App() -> Element {
    let mut current_screen = use_signal(|| Screen::Channel);

    use_context_provider(|| {
        let settings = database::init_database()
            .and_then(|conn| settings_service::load_server_settings(&conn))
            .unwrap_or_else(|e| {
                log::error!("Could not load server settings: {}", e);
                None
            });

        let (server_url, auth_token) = match settings {
            Some(s) => (s.server_url, s.auth_token),
            None => ("http://localhost:8065".to_string(), None),
        };

        let manager = UploadManager::new(UploadManagerConfig { auth_token });
        UploadContext::new(manager, server_url, Arc::new(SqliteDraftStore))
    });

    // Default context: not editing. Edit areas re-provide their own.
    use_context_provider(EditPostContext::default);

    rsx! {
        div { style: "display: flex; flex-direction: column; height: 100vh; font-family: sans-serif;",

            // Main Content
            div { style: "flex: 1; overflow-y: auto;",
                match current_screen() {
                    Screen::Channel => rsx! {
                        ChannelScreen {}
                    },
                    Screen::Settings => rsx! {
                        SettingsScreen {}
                    },
                }
            }

            // Bottom Navigation Bar
            NavigationBar {
                current_screen: current_screen(),
                on_navigate: move |screen| current_screen.set(screen),
            }
        }
    }
}
