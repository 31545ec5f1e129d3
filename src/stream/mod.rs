//! Progress and phase events pushed to clients, the batch job worker, the
//! live TUG pipeline and the client-side connection state machine.

pub mod connection;
pub mod events;
pub mod job;
pub mod live;
