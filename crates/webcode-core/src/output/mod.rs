pub mod model;
pub mod repository;

pub use model::{
    DEFAULT_DISPLAYED_EVENT_COUNT, OutputJsonlEvent, OutputJsonlUsage, OutputPanelState,
};
pub use repository::OutputStateRepository;
