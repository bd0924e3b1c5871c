//! Calendar plugin service.
//!
//! Answers calendar request packets from a paired device with listings of the
//! local calendars and event instances. The [`plugins::PluginManager`] routes
//! inbound packets; the calendar plugin decodes them, checks that read access
//! has been granted, queries the [`plugins::calendar::CalendarStore`] and hands
//! the response packet to the injected [`transport::PacketTransport`].

pub mod config;
pub mod error;
pub mod packet;
pub mod permissions;
pub mod plugins;
pub mod shutdown;
pub mod startup;
pub mod transport;
pub mod utils;
