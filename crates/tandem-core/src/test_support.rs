//! Shared fixtures for unit tests: one `Order` ↔ `OrderTicket` one-to-one
//! relation with the virtual side on `Order`.

use crate::{
    endpoint::{
        CompleteVirtualObjectEndPointLoadState, EndPointContext, EndPointLoader,
        ForeignKeyEndPoint, RealEndPointRef, RelationChange, RelationEndPointId,
        RelationEndPointProvider, TransactionEventSink, VirtualEndPointStateUpdateListener,
        VirtualObjectEndPoint,
    },
    error::InternalError,
    model::{Cardinality, RelationEndPointDefinition},
    obs::{MetricsSink, RelationEvent},
    types::{ObjectId, Ulid},
};
use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

pub(crate) const ORDER_TICKET_VIRTUAL: RelationEndPointDefinition = RelationEndPointDefinition {
    relation_id: "OrderTicket",
    class_id: "Order",
    property_name: "OrderTicket",
    cardinality: Cardinality::One,
    is_virtual: true,
    opposite_class_id: "OrderTicket",
    opposite_property_name: "Order",
};

pub(crate) const ORDER_TICKET_REAL: RelationEndPointDefinition = RelationEndPointDefinition {
    relation_id: "OrderTicket",
    class_id: "OrderTicket",
    property_name: "Order",
    cardinality: Cardinality::One,
    is_virtual: false,
    opposite_class_id: "Order",
    opposite_property_name: "OrderTicket",
};

pub(crate) fn order_id(n: u128) -> ObjectId {
    ObjectId::new("Order", Ulid::from_u128(n))
}

pub(crate) fn ticket_id(n: u128) -> ObjectId {
    ObjectId::new("OrderTicket", Ulid::from_u128(n))
}

pub(crate) fn virtual_id(order: u128) -> RelationEndPointId {
    RelationEndPointId::new(order_id(order), &ORDER_TICKET_VIRTUAL)
}

pub(crate) fn real_id(ticket: u128) -> RelationEndPointId {
    RelationEndPointId::new(ticket_id(ticket), &ORDER_TICKET_REAL)
}

/// Build a real end-point for `ticket` pointing at `order`.
pub(crate) fn ticket_end_point(ticket: u128, order: Option<u128>) -> Rc<ForeignKeyEndPoint> {
    Rc::new(
        ForeignKeyEndPoint::try_new(real_id(ticket), order.map(order_id))
            .expect("real end-point should build"),
    )
}

pub(crate) fn as_ref(end_point: &Rc<ForeignKeyEndPoint>) -> RealEndPointRef {
    end_point.clone()
}

///
/// RecordingLoader
///
/// Completes the end-point with a fixed item and counts calls.
///

#[derive(Debug, Default)]
pub(crate) struct RecordingLoader {
    item: Cell<Option<ObjectId>>,
    calls: Cell<usize>,
}

impl RecordingLoader {
    pub(crate) fn with_item(item: Option<ObjectId>) -> Rc<Self> {
        Rc::new(Self {
            item: Cell::new(item),
            calls: Cell::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl EndPointLoader for RecordingLoader {
    fn load_end_point_and_get_new_state<'a>(
        &self,
        end_point: &'a mut VirtualObjectEndPoint,
    ) -> Result<&'a CompleteVirtualObjectEndPointLoadState, InternalError> {
        self.calls.set(self.calls.get() + 1);
        end_point.mark_data_complete(self.item.get())?;

        end_point.complete_state()
    }
}

///
/// RecordingEventSink
///

#[derive(Debug, Default)]
pub(crate) struct RecordingEventSink {
    pub(crate) events: RefCell<Vec<(&'static str, RelationChange)>>,
}

impl TransactionEventSink for RecordingEventSink {
    fn raise_relation_changing(&self, change: &RelationChange) {
        self.events.borrow_mut().push(("changing", *change));
    }

    fn raise_relation_changed(&self, change: &RelationChange) {
        self.events.borrow_mut().push(("changed", *change));
    }
}

///
/// RecordingListener
///

#[derive(Debug, Default)]
pub(crate) struct RecordingListener {
    pub(crate) updates: RefCell<Vec<(RelationEndPointId, bool)>>,
}

impl VirtualEndPointStateUpdateListener for RecordingListener {
    fn virtual_end_point_state_updated(&self, end_point_id: &RelationEndPointId, has_changed: bool) {
        self.updates.borrow_mut().push((*end_point_id, has_changed));
    }
}

///
/// CapturingMetricsSink
///

#[derive(Debug, Default)]
pub(crate) struct CapturingMetricsSink {
    pub(crate) events: RefCell<Vec<RelationEvent>>,
}

impl MetricsSink for CapturingMetricsSink {
    fn record(&self, event: RelationEvent) {
        self.events.borrow_mut().push(event);
    }
}

///
/// MapProvider
///
/// Parent-transaction end-point map for sub-transaction merges.
///

#[derive(Debug, Default)]
pub(crate) struct MapProvider {
    pub(crate) end_points: BTreeMap<RelationEndPointId, RealEndPointRef>,
}

impl MapProvider {
    pub(crate) fn with(end_points: impl IntoIterator<Item = RealEndPointRef>) -> Self {
        Self {
            end_points: end_points.into_iter().map(|ep| (ep.id(), ep)).collect(),
        }
    }
}

impl RelationEndPointProvider for MapProvider {
    fn get_relation_end_point_without_loading(
        &self,
        end_point_id: &RelationEndPointId,
    ) -> Option<RealEndPointRef> {
        self.end_points.get(end_point_id).cloned()
    }
}

pub(crate) fn context(loader: Rc<RecordingLoader>) -> Rc<EndPointContext> {
    Rc::new(EndPointContext::new(loader))
}

/// Incomplete virtual end-point of `order` whose loader yields `item`.
pub(crate) fn incomplete_end_point(
    order: u128,
    item: Option<u128>,
) -> (VirtualObjectEndPoint, Rc<RecordingLoader>) {
    let loader = RecordingLoader::with_item(item.map(ticket_id));
    let end_point = VirtualObjectEndPoint::new(virtual_id(order), context(loader.clone()))
        .expect("virtual end-point should build");

    (end_point, loader)
}

/// Complete virtual end-point of `order` whose original opposite is the
/// returned real end-point of `ticket`.
pub(crate) fn complete_end_point_with(
    order: u128,
    ticket: u128,
) -> (VirtualObjectEndPoint, Rc<ForeignKeyEndPoint>) {
    let (mut end_point, _) = incomplete_end_point(order, Some(ticket));
    let real = ticket_end_point(ticket, Some(order));

    end_point
        .register_original_opposite_end_point(as_ref(&real))
        .expect("registration should succeed");
    end_point
        .mark_data_complete(Some(ticket_id(ticket)))
        .expect("mark complete should succeed");

    (end_point, real)
}
