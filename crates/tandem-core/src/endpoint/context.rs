//! Collaborator contracts consumed by virtual end-points, and the explicit
//! per-transaction context that carries them.

use crate::{
    config::RelationConfig,
    endpoint::{
        CompleteVirtualObjectEndPointLoadState, RealEndPointRef, RelationEndPointId,
        VirtualObjectEndPoint, VirtualObjectEndPointDataManager,
    },
    error::InternalError,
    obs::{RelationEvent, sink},
    types::ObjectId,
};
use std::{fmt, rc::Rc};

///
/// EndPointLoader
///
/// Fetches a virtual end-point's data from storage. Implementations must
/// install the Complete state on `end_point` themselves (normally through
/// `VirtualObjectEndPoint::mark_data_complete`) and return it.
///

pub trait EndPointLoader {
    fn load_end_point_and_get_new_state<'a>(
        &self,
        end_point: &'a mut VirtualObjectEndPoint,
    ) -> Result<&'a CompleteVirtualObjectEndPointLoadState, InternalError>;
}

///
/// VirtualObjectEndPointDataManagerFactory
///

pub trait VirtualObjectEndPointDataManagerFactory {
    /// Always returns a fresh, empty manager.
    fn create_end_point_data_manager(
        &self,
        end_point_id: RelationEndPointId,
    ) -> VirtualObjectEndPointDataManager;
}

///
/// DefaultDataManagerFactory
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDataManagerFactory;

impl VirtualObjectEndPointDataManagerFactory for DefaultDataManagerFactory {
    fn create_end_point_data_manager(
        &self,
        end_point_id: RelationEndPointId,
    ) -> VirtualObjectEndPointDataManager {
        VirtualObjectEndPointDataManager::new(end_point_id)
    }
}

///
/// RelationEndPointProvider
///
/// Resolves real end-points of the current transaction. Must never trigger a
/// lazy load.
///

pub trait RelationEndPointProvider {
    fn get_relation_end_point_without_loading(
        &self,
        end_point_id: &RelationEndPointId,
    ) -> Option<RealEndPointRef>;
}

///
/// RelationChange
///
/// Payload handed to the transaction event sink for one end-point change.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RelationChange {
    pub end_point_id: RelationEndPointId,
    pub old_related_object: Option<ObjectId>,
    pub new_related_object: Option<ObjectId>,
}

///
/// TransactionEventSink
///
/// Downstream event dispatch (transaction and domain-object listeners).
/// The end-point core only forwards to it and never inspects it.
///

pub trait TransactionEventSink {
    fn raise_relation_changing(&self, change: &RelationChange);

    fn raise_relation_changed(&self, change: &RelationChange);
}

///
/// NullTransactionEventSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NullTransactionEventSink;

impl TransactionEventSink for NullTransactionEventSink {
    fn raise_relation_changing(&self, _: &RelationChange) {}

    fn raise_relation_changed(&self, _: &RelationChange) {}
}

///
/// EndPointContext
///
/// Everything a virtual end-point needs from its transaction, passed
/// explicitly and shared by all end-points of that transaction.
///

pub struct EndPointContext {
    loader: Rc<dyn EndPointLoader>,
    data_manager_factory: Rc<dyn VirtualObjectEndPointDataManagerFactory>,
    event_sink: Rc<dyn TransactionEventSink>,
    config: RelationConfig,
}

impl EndPointContext {
    /// Build a context with the default data-manager factory, a null event
    /// sink and default configuration.
    #[must_use]
    pub fn new(loader: Rc<dyn EndPointLoader>) -> Self {
        Self {
            loader,
            data_manager_factory: Rc::new(DefaultDataManagerFactory),
            event_sink: Rc::new(NullTransactionEventSink),
            config: RelationConfig::default(),
        }
    }

    #[must_use]
    pub fn with_data_manager_factory(
        mut self,
        factory: Rc<dyn VirtualObjectEndPointDataManagerFactory>,
    ) -> Self {
        self.data_manager_factory = factory;
        self
    }

    #[must_use]
    pub fn with_event_sink(mut self, event_sink: Rc<dyn TransactionEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RelationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn loader(&self) -> &Rc<dyn EndPointLoader> {
        &self.loader
    }

    #[must_use]
    pub fn data_manager_factory(&self) -> &dyn VirtualObjectEndPointDataManagerFactory {
        self.data_manager_factory.as_ref()
    }

    #[must_use]
    pub const fn event_sink(&self) -> &Rc<dyn TransactionEventSink> {
        &self.event_sink
    }

    #[must_use]
    pub const fn config(&self) -> &RelationConfig {
        &self.config
    }

    pub(crate) fn record(&self, event: RelationEvent) {
        if self.config.metrics_enabled() {
            sink::record(event);
        }
    }
}

impl fmt::Debug for EndPointContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndPointContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
