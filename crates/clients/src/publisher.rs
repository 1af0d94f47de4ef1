//! Notification publishing to the event bus.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{BookingMessage, Channel};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::error::{ClientError, Result};
use crate::metered::observe;

/// At-least-once publisher of booking notifications.
///
/// Returning `Ok` means the bus acknowledged the message.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, channel: Channel, message: &BookingMessage) -> Result<()>;
}

/// Kafka-backed publisher with one topic per channel.
///
/// Messages are JSON-encoded and keyed by booking id so that every
/// notification for a booking lands on the same partition.
pub struct KafkaEventPublisher {
    producer: FutureProducer,
    guest_topic: String,
    hotelier_topic: String,
    timeout: Duration,
}

impl KafkaEventPublisher {
    /// Connects a producer to `brokers`.
    pub fn new(
        brokers: &str,
        guest_topic: impl Into<String>,
        hotelier_topic: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", "all")
            .create()
            .map_err(|e| ClientError::Transport(format!("failed to create producer: {e}")))?;

        let guest_topic = guest_topic.into();
        let hotelier_topic = hotelier_topic.into();

        tracing::info!(
            brokers = %brokers,
            guest_topic = %guest_topic,
            hotelier_topic = %hotelier_topic,
            "Kafka event publisher created"
        );

        Ok(Self {
            producer,
            guest_topic,
            hotelier_topic,
            timeout,
        })
    }

    fn topic(&self, channel: Channel) -> &str {
        match channel {
            Channel::Guest => &self.guest_topic,
            Channel::Hotelier => &self.hotelier_topic,
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    #[tracing::instrument(skip(self, message), fields(booking_id = %message.booking_id))]
    async fn publish(&self, channel: Channel, message: &BookingMessage) -> Result<()> {
        observe("event_bus", channel.as_str(), async {
            let topic = self.topic(channel);
            let payload = serde_json::to_vec(message)?;
            let key = message.booking_id.to_string();

            let record = FutureRecord::to(topic).payload(&payload).key(&key);

            match self.producer.send(record, Timeout::After(self.timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(topic, partition, offset, "Notification published");
                    Ok(())
                }
                Err((err, _)) => {
                    tracing::error!(topic, error = %err, "Failed to publish notification");
                    Err(ClientError::Transport(err.to_string()))
                }
            }
        })
        .await
    }
}

#[derive(Debug, Default)]
struct InMemoryPublisherState {
    published: Vec<(Channel, BookingMessage)>,
    fail_on: Option<Channel>,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<InMemoryPublisherState>>,
}

impl InMemoryEventPublisher {
    /// Creates a publisher that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures publishes on `channel` to fail. `None` clears the toggle.
    pub fn set_fail_on(&self, channel: Option<Channel>) {
        self.state.write().unwrap().fail_on = channel;
    }

    /// Every accepted message, in publish order.
    pub fn published(&self) -> Vec<(Channel, BookingMessage)> {
        self.state.read().unwrap().published.clone()
    }

    /// Accepted messages on one channel.
    pub fn published_on(&self, channel: Channel) -> Vec<BookingMessage> {
        self.state
            .read()
            .unwrap()
            .published
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, channel: Channel, message: &BookingMessage) -> Result<()> {
        let mut state = self.state.write().unwrap();

        if state.fail_on == Some(channel) {
            return Err(ClientError::Transport(format!("{channel} topic unavailable")));
        }

        state.published.push((channel, message.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{BookingId, HotelId};

    fn message() -> BookingMessage {
        BookingMessage {
            booking_id: BookingId::new(42),
            hotel_id: HotelId::new(7),
            hotel_name: "Grand".to_string(),
            room_description: "Sea view".to_string(),
            room_number: 204,
            user_name: "guest".to_string(),
            chat_id: "chat-1".to_string(),
            start_date: "2025-06-01".to_string(),
            end_date: "2025-06-03".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_per_channel() {
        let publisher = InMemoryEventPublisher::new();
        publisher.publish(Channel::Guest, &message()).await.unwrap();
        publisher
            .publish(Channel::Hotelier, &message())
            .await
            .unwrap();

        assert_eq!(publisher.published().len(), 2);
        assert_eq!(publisher.published_on(Channel::Guest).len(), 1);
        assert_eq!(publisher.published_on(Channel::Hotelier).len(), 1);
    }

    #[tokio::test]
    async fn test_fail_on_single_channel() {
        let publisher = InMemoryEventPublisher::new();
        publisher.set_fail_on(Some(Channel::Hotelier));

        assert!(publisher.publish(Channel::Guest, &message()).await.is_ok());
        assert!(publisher
            .publish(Channel::Hotelier, &message())
            .await
            .is_err());
        assert_eq!(publisher.published().len(), 1);
    }
}
