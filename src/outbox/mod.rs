use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Event Envelope - metadata around a domain event
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventEnvelope<E> {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub event_version: i32,
    pub event_data: E,
    /// Groups the events written by one engine operation
    pub correlation_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl<E: DomainEvent> EventEnvelope<E> {
    pub fn new(aggregate_id: Uuid, event_type: impl Into<String>, event_data: E, correlation_id: Uuid) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            event_type: event_type.into(),
            event_version: E::event_version(),
            event_data,
            correlation_id,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type() -> &'static str where Self: Sized;
    fn event_version() -> i32 where Self: Sized { 1 }
}

// ============================================================================
// Outbox Message - serialized envelope as stored next to the state change
// ============================================================================
//
// A relay outside this crate reads these rows and publishes them; here they
// are only written, in the same store transaction as the change they
// describe.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_id: Uuid,
    pub event_type: String,
    pub event_version: i32,
    pub payload: String,
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl OutboxMessage {
    pub fn from_envelope<E: DomainEvent>(envelope: &EventEnvelope<E>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::now_v7(),
            aggregate_id: envelope.aggregate_id,
            aggregate_type: E::event_type().to_string(),
            event_id: envelope.event_id,
            event_type: envelope.event_type.clone(),
            event_version: envelope.event_version,
            payload: serde_json::to_string(&envelope.event_data)?,
            correlation_id: envelope.correlation_id,
            created_at: Utc::now(),
        })
    }

    pub fn decode<E: DomainEvent>(&self) -> Result<E, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Pinged {
        count: u32,
    }

    impl DomainEvent for Pinged {
        fn event_type() -> &'static str { "Ping" }
    }

    #[test]
    fn test_outbox_message_from_envelope() {
        let aggregate_id = Uuid::now_v7();
        let correlation_id = Uuid::now_v7();
        let envelope = EventEnvelope::new(aggregate_id, "Pinged", Pinged { count: 3 }, correlation_id);

        let message = OutboxMessage::from_envelope(&envelope).unwrap();

        assert_eq!(message.aggregate_id, aggregate_id);
        assert_eq!(message.aggregate_type, "Ping");
        assert_eq!(message.event_type, "Pinged");
        assert_eq!(message.event_id, envelope.event_id);
        assert_eq!(message.event_version, 1);
        assert_eq!(message.correlation_id, correlation_id);
        assert_eq!(message.decode::<Pinged>().unwrap(), Pinged { count: 3 });
    }
}
