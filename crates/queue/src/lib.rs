//! Durable AMQP queue client for log batches and report requests.
//!
//! Each message class gets a direct exchange with a main queue, a retry
//! queue and a dead-letter queue ([`topology`]). Failed deliveries are
//! republished to the retry queue with an incremented `x-retry-count`
//! header until the class's ceiling, then dead-lettered ([`settle`]).
//!
//! The API holds the client behind the [`BatchQueue`] trait.

pub mod batch_queue;
pub mod client;
pub mod config;
pub mod error;
pub mod reconnect;
pub mod settle;
pub mod topology;

pub use batch_queue::BatchQueue;
pub use client::{HandlerError, MessageHandler, QueueClient};
pub use config::QueueConfig;
pub use error::QueueError;
pub use topology::QueueTopology;
