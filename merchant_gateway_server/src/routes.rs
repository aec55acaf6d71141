//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: everything that is more than a line or two belongs in
//! the engine's [`GatewayApi`].
//!
//! Every handler is async. Since each worker thread processes its requests sequentially, a handler that blocks the
//! thread (e.g. `std::thread::sleep`, synchronous file or database I/O) would stall every other request on that
//! worker.
use std::str::FromStr;

use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use merchant_gateway_engine::{
    db_types::{OrderId, OrderStatus},
    traits::{GatewayBackend, OrderManagement},
    CreateOrderRequest,
    GatewayApi,
    OrderStatusUpdate,
};

use crate::errors::ServerError;

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Order and status bodies arrive either as JSON or as an urlencoded form.
pub type JsonOrForm<T> = web::Either<web::Json<T>, web::Form<T>>;

fn into_inner<T>(body: JsonOrForm<T>) -> T {
    match body {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    }
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/gateways/{gateway_id}/orders" impl GatewayBackend, OrderManagement);
/// Route handler for order creation.
///
/// The shop front posts `amount`, and optionally `id`, `signature` and `data`. When the gateway enforces signatures,
/// `signature` must be the hex HMAC-SHA1 of `id` under the gateway secret.
///
/// Responses:
/// * `200` with the new order as JSON.
/// * `400` when the order id is missing or the amount is negative.
/// * `403` when the signature does not match.
/// * `404` when the gateway does not exist.
pub async fn create_order<B, O>(
    path: web::Path<i64>,
    body: JsonOrForm<CreateOrderRequest>,
    api: web::Data<GatewayApi<B, O>>,
) -> Result<HttpResponse, ServerError>
where
    B: GatewayBackend,
    O: OrderManagement,
{
    let gateway_id = path.into_inner();
    let request = into_inner(body);
    trace!("💻️ Received order request for gateway #{gateway_id}: {request:?}");
    let order = api.create_order(gateway_id, request).await.map_err(|e| {
        debug!("💻️ Could not create order on gateway #{gateway_id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(order))
}

route!(order_by_id => Get "/gateways/{gateway_id}/orders/{order_id}" impl GatewayBackend, OrderManagement);
pub async fn order_by_id<B, O>(
    path: web::Path<(i64, String)>,
    api: web::Data<GatewayApi<B, O>>,
) -> Result<HttpResponse, ServerError>
where
    B: GatewayBackend,
    O: OrderManagement,
{
    let (gateway_id, order_id) = path.into_inner();
    trace!("💻️ Fetching order [{order_id}] on gateway #{gateway_id}");
    let order = api.fetch_order(gateway_id, &OrderId::new(order_id)).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/gateways/{gateway_id}/orders/{order_id}/status" impl GatewayBackend, OrderManagement);
/// Route handler for status transitions reported by the blockchain monitor.
///
/// The new status is persisted and the merchant callback is queued. The response does not wait for the callback to be
/// delivered.
pub async fn update_order_status<B, O>(
    path: web::Path<(i64, String)>,
    body: JsonOrForm<OrderStatusUpdate>,
    api: web::Data<GatewayApi<B, O>>,
) -> Result<HttpResponse, ServerError>
where
    B: GatewayBackend,
    O: OrderManagement,
{
    let (gateway_id, order_id) = path.into_inner();
    let update = into_inner(body);
    let status = OrderStatus::from_str(&update.status).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    info!("💻️ Order [{order_id}] on gateway #{gateway_id} reported as {status}");
    let order = api.update_order_status(gateway_id, &OrderId::new(order_id), status, update.tid).await?;
    Ok(HttpResponse::Ok().json(order))
}
