use std::sync::Arc;

use crate::embedding::M3Encoder;
use crate::scoring::Scorer;

/// Shared state for every gateway handler.
pub struct HandlerState<E: ?Sized> {
    pub scorer: Scorer<E>,
}

impl<E: ?Sized> Clone for HandlerState<E> {
    fn clone(&self) -> Self {
        Self {
            scorer: self.scorer.clone(),
        }
    }
}

impl<E: M3Encoder + ?Sized> HandlerState<E> {
    pub fn new(encoder: Arc<E>) -> Self {
        Self {
            scorer: Scorer::new(encoder),
        }
    }

    pub fn encoder(&self) -> &Arc<E> {
        self.scorer.encoder()
    }
}
