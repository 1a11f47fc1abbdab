// Domain models

mod container;
mod metrics;
mod runtime;
mod snapshot;

pub use container::{ContainerDescriptor, ContainerState, PortMapping, SHORT_ID_LEN, short_id};
pub use metrics::{ContainerMetrics, CounterPair, CounterSnapshot, InterfaceCounters};
pub use runtime::{RuntimeInfo, RuntimeStatus};
pub use snapshot::{AggregatedSnapshot, ContainerEntry};
