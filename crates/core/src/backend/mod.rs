//! Backend interface
//!
//! The reservation workflow talks to the authoritative slot store through
//! this trait, allowing for different implementations (REST, in-memory).

#[cfg(any(test, feature = "testing"))]
mod memory;

use std::future::Future;
use std::sync::Arc;

use crate::error::BackendError;
use crate::models::{Catalog, CollectionId, CommitRequest, HeldSlot};

#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryBackend;

/// Authoritative slot store for one authenticated participant
pub trait SlotBackend: Send + Sync {
    /// Fetch every team and slot of a collection
    fn fetch_collection(
        &self,
        collection: &CollectionId,
    ) -> impl Future<Output = Result<Catalog, BackendError>> + Send;

    /// Slot currently held by the authenticated participant, if any
    fn my_slot(
        &self,
        collection: &CollectionId,
    ) -> impl Future<Output = Result<Option<HeldSlot>, BackendError>> + Send;

    /// Ask the backend to accept a book, release or assign action
    fn commit(
        &self,
        collection: &CollectionId,
        request: &CommitRequest,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

impl<B: SlotBackend> SlotBackend for Arc<B> {
    fn fetch_collection(
        &self,
        collection: &CollectionId,
    ) -> impl Future<Output = Result<Catalog, BackendError>> + Send {
        (**self).fetch_collection(collection)
    }

    fn my_slot(
        &self,
        collection: &CollectionId,
    ) -> impl Future<Output = Result<Option<HeldSlot>, BackendError>> + Send {
        (**self).my_slot(collection)
    }

    fn commit(
        &self,
        collection: &CollectionId,
        request: &CommitRequest,
    ) -> impl Future<Output = Result<(), BackendError>> + Send {
        (**self).commit(collection, request)
    }
}
