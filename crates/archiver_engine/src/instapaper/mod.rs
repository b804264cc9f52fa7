//! [`BookmarkSource`](crate::BookmarkSource) over the Instapaper Full API.
mod client;
mod decode;
mod oauth;
mod wire;

pub use client::{ClientSettings, InstapaperClient, DEFAULT_BASE_URL};
pub use oauth::Credentials;
