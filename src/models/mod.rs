pub mod draft;
pub mod post;
pub mod server_settings;

pub use draft::Draft;
pub use post::SentPost;
pub use server_settings::ServerSettings;
