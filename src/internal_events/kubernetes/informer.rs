use metrics::counter;

use crate::internal_events::InternalEvent;

#[derive(Debug)]
pub struct StateItemAdded;

#[derive(Debug)]
pub struct StateItemUpdated;

#[derive(Debug)]
pub struct StateItemDeleted;

impl InternalEvent for StateItemAdded {
    fn emit(self) {
        counter!("k8s_state_ops_total", "op_kind" => "item_added").increment(1);
    }
}

impl InternalEvent for StateItemUpdated {
    fn emit(self) {
        counter!("k8s_state_ops_total", "op_kind" => "item_updated").increment(1);
    }
}

impl InternalEvent for StateItemDeleted {
    fn emit(self) {
        counter!("k8s_state_ops_total", "op_kind" => "item_deleted").increment(1);
    }
}

/// Emitted when a relist of the watched resources completes.
#[derive(Debug)]
pub struct StateResynced {
    pub retained: usize,
    pub removed: usize,
}

impl InternalEvent for StateResynced {
    fn emit(self) {
        debug!(
            message = "Relist completed.",
            retained = self.retained,
            removed = self.removed,
        );
        counter!("k8s_state_ops_total", "op_kind" => "resynced").increment(1);
    }
}
