use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arledger_core::{AggregateId, CompanyId};

/// Envelope for an event, containing company + stream metadata.
///
/// This is the unit handed back to callers of the move lifecycle so they can
/// persist or forward what happened.
///
/// - `company_id` is the accounting boundary the event belongs to.
/// - `sequence_number` is the aggregate version right after the event was
///   applied (monotonically increasing per stream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    company_id: CompanyId,

    aggregate_id: AggregateId,

    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        company_id: CompanyId,
        aggregate_id: AggregateId,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            company_id,
            aggregate_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_envelope_gets_its_own_id() {
        let company = CompanyId::new();
        let aggregate = AggregateId::new();
        let first = EventEnvelope::new(company, aggregate, 1, "created");
        let second = EventEnvelope::new(company, aggregate, 2, "posted");

        assert_ne!(first.event_id(), second.event_id());
        assert_eq!(second.company_id(), company);
        assert_eq!(second.aggregate_id(), aggregate);
        assert_eq!(second.sequence_number(), 2);
        assert_eq!(*second.payload(), "posted");
    }
}
