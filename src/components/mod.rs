mod channel;
mod draft_area;
mod gallery_view;
mod navigation;
mod settings;

pub use channel::ChannelScreen;
pub use draft_area::DraftArea;
pub use gallery_view::FullscreenAttachment;
pub use navigation::NavigationBar;
pub use settings::SettingsScreen;
