use std::sync::Arc;

use crate::shared::{CoreError, CoreResult, Elevator};
use crate::store::StateStore;

/// Read-only view of the fleet, straight from the store.
pub struct StatusQuery {
    store: Arc<dyn StateStore>,
}

impl StatusQuery {
    pub fn new(store: Arc<dyn StateStore>) -> StatusQuery {
        StatusQuery { store }
    }

    /// One elevator (empty when unknown) or the whole fleet in id order.
    pub fn status(&self, elevator_id: Option<u32>) -> CoreResult<Vec<Elevator>> {
        match elevator_id {
            Some(id) => match self.store.get_elevator(id) {
                Ok(elevator) => Ok(vec![elevator]),
                Err(CoreError::NotFound(_)) => Ok(Vec::new()),
                Err(e) => Err(e),
            },
            None => self.store.list_elevators(),
        }
    }
}
