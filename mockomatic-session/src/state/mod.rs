pub mod clock;
pub mod draft;
pub mod interval;
pub mod keys;
pub mod schema;
pub mod template;
pub mod timeline;
pub mod timing;
pub mod validation;

// Re-export the data model for convenience
pub use clock::ClockTime;
pub use interval::Interval;
pub use schema::{
    Circuit, Run, SessionDraft, SessionSettings, Slot, SlotTime, Station, Template,
    TemplateStation,
};
