//! Notification channels and their delivery record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical delivery channel of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Messages addressed to the guest who made the booking.
    Guest,
    /// Messages addressed to the owner of the booked hotel.
    Hotelier,
}

impl Channel {
    /// Channels in the order a confirmed booking notifies them.
    pub const ALL: [Channel; 2] = [Channel::Guest, Channel::Hotelier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Guest => "guest",
            Channel::Hotelier => "hotelier",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which channels already carried a booking's confirmation.
///
/// Recorded separately from the booking status so that a webhook retried
/// after a partial fan-out can finish the channels still outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Deliveries {
    pub guest: bool,
    pub hotelier: bool,
}

impl Deliveries {
    pub const NONE: Deliveries = Deliveries {
        guest: false,
        hotelier: false,
    };

    pub fn contains(&self, channel: Channel) -> bool {
        match channel {
            Channel::Guest => self.guest,
            Channel::Hotelier => self.hotelier,
        }
    }

    /// Channels not yet delivered, in notification order.
    pub fn outstanding(self) -> impl Iterator<Item = Channel> {
        Channel::ALL
            .into_iter()
            .filter(move |channel| !self.contains(*channel))
    }
}
