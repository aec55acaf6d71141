use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Gateway, NewOrder, Order, OrderId, OrderStatus},
    events::{EventProducers, OrderStatusChangedEvent},
    gateway_api::{errors::GatewayError, order_objects::CreateOrderRequest},
    helpers::verify,
    traits::{GatewayBackend, OrderManagement, OrderManagementError},
};

/// Checks an order request against the gateway's signature policy.
///
/// When the gateway enforces signatures, the id must be present and non-empty (else `InvalidOrderId`), and only then is
/// the signature checked against `HMAC(id, secret)` (else `InvalidSignature`). Gateways that do not enforce signatures
/// accept any request.
///
/// Returns the caller's order id, if it supplied a usable one.
pub fn authorize_order_request(
    gateway: &Gateway,
    request: &CreateOrderRequest,
) -> Result<Option<OrderId>, GatewayError> {
    let id = request.id.as_deref().filter(|id| !id.is_empty());
    if gateway.check_signature {
        let id = id.ok_or(GatewayError::InvalidOrderId)?;
        let signature = request.signature.as_deref().unwrap_or_default();
        if !verify(id, signature, gateway.secret.as_ref()) {
            return Err(GatewayError::InvalidSignature);
        }
    }
    Ok(id.map(OrderId::new))
}

/// `GatewayApi` authorises new orders, allocates their keychain ids and announces status changes.
///
/// `B` supplies gateways and keychain ids (either the config file store or the database), while `O` is the order
/// factory that builds and stores the orders themselves.
pub struct GatewayApi<B, O> {
    backend: B,
    orders: O,
    producers: EventProducers,
}

impl<B, O> Debug for GatewayApi<B, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GatewayApi")
    }
}

impl<B: Clone, O: Clone> Clone for GatewayApi<B, O> {
    fn clone(&self) -> Self {
        Self { backend: self.backend.clone(), orders: self.orders.clone(), producers: self.producers.clone() }
    }
}

impl<B, O> GatewayApi<B, O> {
    pub fn new(backend: B, orders: O, producers: EventProducers) -> Self {
        Self { backend, orders, producers }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn orders(&self) -> &O {
        &self.orders
    }
}

impl<B, O> GatewayApi<B, O>
where
    B: GatewayBackend,
    O: OrderManagement,
{
    pub async fn fetch_gateway(&self, gateway_id: i64) -> Result<Gateway, GatewayError> {
        let gateway = self.backend.find_by_id(gateway_id).await?;
        Ok(gateway)
    }

    pub async fn fetch_gateways(&self) -> Result<Vec<Gateway>, GatewayError> {
        let gateways = self.backend.fetch_gateways().await?;
        Ok(gateways)
    }

    /// Creates a new order for the given gateway.
    ///
    /// Nothing is allocated or stored unless the request passes the gateway's signature policy.
    pub async fn create_order(&self, gateway_id: i64, request: CreateOrderRequest) -> Result<Order, GatewayError> {
        let gateway = self.fetch_gateway(gateway_id).await?;
        self.create_order_for_gateway(&gateway, request).await
    }

    pub async fn create_order_for_gateway(
        &self,
        gateway: &Gateway,
        request: CreateOrderRequest,
    ) -> Result<Order, GatewayError> {
        let order_id = authorize_order_request(gateway, &request).map_err(|e| {
            debug!("🔐️ Order request for gateway #{} rejected. {e}", gateway.id);
            e
        })?;
        if request.amount.value() < 0 {
            return Err(GatewayError::InvalidAmount(request.amount));
        }
        if let Some(id) = &order_id {
            if self.orders.fetch_order(gateway.id, id).await?.is_some() {
                debug!("📦️ Order [{id}] already exists on gateway '{}'. No keychain id allocated", gateway.name);
                return Err(OrderManagementError::OrderAlreadyExists(id.clone()).into());
            }
        }
        let keychain_id = self.backend.next_id(gateway).await?;
        let id = order_id.unwrap_or_else(|| OrderId::for_keychain_id(gateway.id, keychain_id));
        let mut new_order = NewOrder::new(gateway.id, id, request.amount, keychain_id);
        new_order.data = request.data;
        let order = self.orders.create_order(gateway, new_order).await?;
        info!(
            "📦️ Order [{}] created for gateway '{}' with keychain id {keychain_id} and amount {}",
            order.id, gateway.name, order.amount
        );
        Ok(order)
    }

    pub async fn fetch_order(&self, gateway_id: i64, order_id: &OrderId) -> Result<Order, GatewayError> {
        self.orders.fetch_order(gateway_id, order_id).await?.ok_or_else(|| GatewayError::OrderNotFound(order_id.clone()))
    }

    /// Announces a status transition to the callback machinery and returns straight away.
    ///
    /// Delivery happens in the subscribed handlers, so this never waits on the merchant's endpoint.
    pub async fn order_status_changed(&self, order: &Order) -> Result<(), GatewayError> {
        let gateway = self.fetch_gateway(order.gateway_id).await?;
        debug!("📦️ Order [{}] on gateway '{}' is now {}", order.id, gateway.name, order.status);
        let event = OrderStatusChangedEvent::new(gateway, order.clone());
        self.producers.publish_order_status_changed(event).await;
        Ok(())
    }

    /// Persists a status transition reported by the blockchain monitor, then announces it.
    pub async fn update_order_status(
        &self,
        gateway_id: i64,
        order_id: &OrderId,
        status: OrderStatus,
        tid: Option<String>,
    ) -> Result<Order, GatewayError> {
        self.fetch_gateway(gateway_id).await?;
        let order = self.orders.update_order_status(gateway_id, order_id, status, tid).await?;
        self.order_status_changed(&order).await?;
        Ok(order)
    }
}
