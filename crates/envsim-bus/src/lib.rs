//! envsim Bus: the simulator's view of the message bus
//!
//! The simulator talks to the rest of the system exclusively through named
//! channels. This crate defines:
//!
//! - **Channels**: the four channel names and their direction
//! - **Events**: JSON payloads carried on each channel
//! - **MessageBus**: the async transport trait the simulator depends on
//! - **InMemoryBus**: an in-process implementation used by the CLI and tests
//!
//! ```text
//!   sensor-created ──────┐                 ┌────> sensor-reading
//!                        ├──> simulator ───┤
//!   sensor-status-change ┘                 └────> sensor-status
//! ```
//!
//! # Example
//!
//! ```
//! use envsim_bus::{publish_event, Channel, InMemoryBus, MessageBus, SensorStatus, SensorStatusEvent};
//!
//! # tokio_test::block_on(async {
//! let bus = InMemoryBus::new();
//! let mut statuses = bus.subscribe(Channel::SensorStatus).await.unwrap();
//!
//! let event = SensorStatusEvent::now(1, "owner-1".to_string(), SensorStatus::Active);
//! publish_event(&bus, &event).await.unwrap();
//!
//! let message = statuses.recv().await.unwrap();
//! let decoded: SensorStatusEvent = message.decode().unwrap();
//! assert_eq!(decoded.status, SensorStatus::Active);
//! # });
//! ```

pub mod bus;
pub mod channel;
pub mod error;
pub mod events;
pub mod memory;

pub use bus::{publish_event, BusEvent, BusMessage, MessageBus, Subscription};
pub use channel::{Channel, Direction};
pub use error::BusError;
pub use events::{
    SensorCreatedEvent, SensorReadingEvent, SensorStatus, SensorStatusChangeEvent,
    SensorStatusEvent,
};
pub use memory::{InMemoryBus, DEFAULT_JOURNAL_CAPACITY};
