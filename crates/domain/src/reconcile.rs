//! Pure planning for the payment webhook.
//!
//! The webhook handler asks [`plan_reconciliation`] what to do given the
//! stored status and the gateway's outcome, then executes the returned
//! effects in order. Keeping the decision pure lets the notification fan-out
//! be tested without a database or an event bus.

use crate::{BookingStatus, Channel, Deliveries, PaymentStatus, StatusTransition};

/// A side effect the webhook handler must perform, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Durably record the new status. Always first when present.
    PersistStatus(BookingStatus),
    /// Publish the confirmation on one channel and record the delivery.
    Notify(Channel),
}

/// How an incoming outcome relates to the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// `pending` settles on a terminal status.
    Transition,
    /// The status is already settled but some confirmations were never
    /// delivered; only those are sent.
    Resumed,
    /// The same terminal status is already stored and fully delivered.
    Duplicate,
    /// A different terminal status is already stored; the outcome is ignored.
    Contradicting,
}

/// What the webhook handler should do for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub disposition: Disposition,
    pub effects: Vec<Effect>,
}

impl ReconciliationPlan {
    /// Returns true if the plan publishes any notification.
    pub fn notifies(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, Effect::Notify(_)))
    }
}

/// Decides the new status and side effects for a webhook delivery.
///
/// Notifications go out for successful payments only, after the status is
/// persisted, and only on channels not yet in `delivered`. A confirmed
/// booking with undelivered channels resumes the fan-out.
pub fn plan_reconciliation(
    current: BookingStatus,
    delivered: Deliveries,
    incoming: PaymentStatus,
) -> ReconciliationPlan {
    let target = incoming.booking_status();
    let notifications = || -> Vec<Effect> {
        if incoming == PaymentStatus::Success {
            delivered.outstanding().map(Effect::Notify).collect()
        } else {
            Vec::new()
        }
    };

    match current.transition_to(target) {
        Ok(StatusTransition::Changed) => {
            let mut effects = vec![Effect::PersistStatus(target)];
            effects.extend(notifications());
            ReconciliationPlan {
                disposition: Disposition::Transition,
                effects,
            }
        }
        Ok(StatusTransition::Unchanged) => {
            let effects = notifications();
            let disposition = if effects.is_empty() {
                Disposition::Duplicate
            } else {
                Disposition::Resumed
            };
            ReconciliationPlan {
                disposition,
                effects,
            }
        }
        Err(_) => ReconciliationPlan {
            disposition: Disposition::Contradicting,
            effects: Vec::new(),
        },
    }
}
