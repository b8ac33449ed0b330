pub mod draft_service;
pub mod edit_session;
pub mod settings_service;
