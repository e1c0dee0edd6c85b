//! The search engine: snapping input locations onto directed edges.

mod correlate;
mod island;
mod search;

pub use island::island;
pub use search::{
    DEFAULT_ANGLE_WIDTH, HEADING_SAMPLE, NODE_SNAP, NO_HEADING, SEARCH_CUTOFF,
    SIDE_OF_STREET_SNAP, search,
};
