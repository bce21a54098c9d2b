mod sessions;
mod settings;
mod tags;

pub use sessions::RawSessionRow;
pub use settings::RawSettingsRow;
pub use tags::RawTagRow;
