pub mod history;
pub mod reference;
pub mod user;
pub mod worker;

pub use history::{HistoryEvent, HistoryEventRow, HistoryRecord};
pub use reference::{ReferenceEntry, ReferencePolicy, ReferenceTable};
pub use user::{NewUser, User, UserProfile, UserRow};
pub use worker::{WorkerDetails, WorkerRecord};
