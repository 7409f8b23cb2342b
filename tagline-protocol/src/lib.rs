pub mod event;

pub mod prelude {
    pub use crate::event::{DocumentEvent, DocumentEventBuilder, DocumentEventPayload};
}
