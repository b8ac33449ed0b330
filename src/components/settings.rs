use dioxus::prelude::*;

use crate::database;
use crate::models::ServerSettings;
use crate::services::settings_service;

#[derive(Clone, PartialEq)]
enum SaveStatus {
    Idle,
    Saved,
    Error(String),
}

/// Server connection settings form
#[component]
pub fn SettingsScreen() -> Element {
    let mut server_url = use_signal(String::new);
    let mut auth_token = use_signal(String::new);
    let mut display_name = use_signal(String::new);
    let mut status = use_signal(|| SaveStatus::Idle);

    // Load stored settings on mount
    use_effect(move || {
        spawn(async move {
            let loaded = database::init_database()
                .and_then(|conn| settings_service::load_server_settings(&conn));
            match loaded {
                Ok(Some(settings)) => {
                    server_url.set(settings.server_url);
                    auth_token.set(settings.auth_token.unwrap_or_default());
                    display_name.set(settings.display_name);
                }
                Ok(None) => {}
                Err(e) => log::error!("Could not load settings: {}", e),
            }
        });
    });

    let on_save = move |_| {
        let token = auth_token();
        let settings = ServerSettings::new(
            &server_url(),
            if token.is_empty() { None } else { Some(token) },
            &display_name(),
        );
        spawn(async move {
            let result = database::init_database()
                .and_then(|conn| settings_service::save_server_settings(&conn, &settings));
            match result {
                Ok(_) => status.set(SaveStatus::Saved),
                Err(e) => status.set(SaveStatus::Error(e.user_message())),
            }
        });
    };

    let field_style = "width: 100%; padding: 10px; border: 1px solid #ccc; border-radius: 8px; font-size: 14px; box-sizing: border-box;";
    let label_style = "display: block; font-size: 13px; color: #555; margin: 12px 0 4px;";

    rsx! {
        div {
            style: "padding: 16px; max-width: 480px;",
            h2 { style: "margin: 0 0 8px;", "Settings" }

            label { style: "{label_style}", "Server URL" }
            input {
                style: "{field_style}",
                placeholder: "https://chat.example.com",
                value: "{server_url}",
                oninput: move |evt| server_url.set(evt.value()),
            }

            label { style: "{label_style}", "Access token" }
            input {
                style: "{field_style}",
                r#type: "password",
                value: "{auth_token}",
                oninput: move |evt| auth_token.set(evt.value()),
            }

            label { style: "{label_style}", "Display name" }
            input {
                style: "{field_style}",
                value: "{display_name}",
                oninput: move |evt| display_name.set(evt.value()),
            }

            button {
                style: "margin-top: 16px; padding: 10px 20px; background: #1c58d9; color: white; border: none; border-radius: 8px; cursor: pointer; font-size: 14px;",
                onclick: on_save,
                "Save"
            }

            match status() {
                SaveStatus::Idle => rsx! {},
                SaveStatus::Saved => rsx! {
                    p { style: "color: #2e7d32; font-size: 13px;", "Saved. Takes effect after restart." }
                },
                SaveStatus::Error(msg) => rsx! {
                    p { style: "color: #c62828; font-size: 13px;", "{msg}" }
                },
            }
        }
    }
}
