//! Wires the engine's order events to merchant callback delivery.
use log::*;
use merchant_gateway_engine::{
    events::{EventHandlers, EventHooks, OrderStatusChangedEvent},
    CallbackDispatcher,
    ReqwestCallbackClient,
    SqliteDatabase,
};

pub const CALLBACK_EVENT_BUFFER_SIZE: usize = 25;

/// Builds the event handlers that deliver a merchant callback for every order status change.
///
/// Each event is handled in its own task, so a slow merchant endpoint only delays its own order's notifications.
pub fn create_callback_event_handlers(
    dispatcher: CallbackDispatcher<SqliteDatabase, ReqwestCallbackClient>,
) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_status_changed(move |ev| {
        let OrderStatusChangedEvent { gateway, order } = ev;
        let dispatcher = dispatcher.clone();
        debug!("📬️ Order [{}] changed to {}. Queueing callback for gateway '{}'", order.id, order.status, gateway.name);
        Box::pin(async move {
            let outcome = dispatcher.dispatch(&gateway, &order).await;
            trace!("📬️ Callback for order [{}] finished: {outcome:?}", order.id);
        })
    });
    EventHandlers::new(CALLBACK_EVENT_BUFFER_SIZE, hooks)
}
