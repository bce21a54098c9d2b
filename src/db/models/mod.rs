pub mod session;
pub mod settings;
pub mod tag;
pub mod timer_state;

pub use session::{NewSession, Session, SessionKey, SessionKind};
pub use settings::{SoundType, UserSettings};
pub use tag::{NewTag, Tag};
pub use timer_state::ActiveTimerState;
