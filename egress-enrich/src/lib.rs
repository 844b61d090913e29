pub mod enricher;
pub mod fanout;
pub mod registry;

pub use enricher::{Enricher, EnricherFactory};
pub use fanout::{EnricherSet, FanOutReport};
pub use registry::EnricherRegistry;
