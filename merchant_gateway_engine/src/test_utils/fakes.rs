//! An in-memory stand-in for the order factory.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;

use crate::{
    db_types::{CallbackResponse, Gateway, NewOrder, Order, OrderId, OrderStatus},
    traits::{OrderManagement, OrderManagementError},
};

/// An order factory that keeps orders in a map, and remembers every factory call it received.
#[derive(Clone, Debug, Default)]
pub struct MemoryOrderStore {
    orders: Arc<Mutex<HashMap<(i64, OrderId), Order>>>,
    requests: Arc<Mutex<Vec<NewOrder>>>,
}

impl MemoryOrderStore {
    pub fn factory_calls(&self) -> Vec<NewOrder> {
        self.requests.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OrderManagement for MemoryOrderStore {
    async fn create_order(&self, _gateway: &Gateway, order: NewOrder) -> Result<Order, OrderManagementError> {
        self.requests.lock().unwrap().push(order.clone());
        let mut orders = self.orders.lock().unwrap();
        let key = (order.gateway_id, order.id.clone());
        if orders.contains_key(&key) {
            return Err(OrderManagementError::OrderAlreadyExists(order.id));
        }
        let order = Order::from_new(order);
        orders.insert(key, order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, gateway_id: i64, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        Ok(self.orders.lock().unwrap().get(&(gateway_id, order_id.clone())).cloned())
    }

    async fn update_order_status(
        &self,
        gateway_id: i64,
        order_id: &OrderId,
        status: OrderStatus,
        tid: Option<String>,
    ) -> Result<Order, OrderManagementError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&(gateway_id, order_id.clone()))
            .ok_or_else(|| OrderManagementError::OrderNotFound(order_id.clone()))?;
        order.status = status;
        if tid.is_some() {
            order.tid = tid;
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn save_callback_response(
        &self,
        order: &Order,
        response: &CallbackResponse,
    ) -> Result<(), OrderManagementError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&(order.gateway_id, order.id.clone()))
            .ok_or_else(|| OrderManagementError::OrderNotFound(order.id.clone()))?;
        order.callback_response = Some(response.clone());
        Ok(())
    }
}
