use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use cucumber::World;
use log::*;
use merchant_gateway_engine::{
    db_types::{CallbackResponse, Gateway, Order},
    events::EventProducers,
    test_utils::{
        mocks::MockCallbackClient,
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    CallbackDispatcher,
    GatewayApi,
    GatewayError,
    GatewayStore,
    RetryPolicy,
    SqliteDatabase,
};

pub const CALLBACK_URL: &str = "http://merchant.example.com/payment-callback";

#[derive(Default, Debug, World)]
pub struct GatewayWorld {
    pub system: Option<GatewaySystem>,
    pub last_result: Option<Result<Order, GatewayError>>,
}

#[derive(Debug)]
pub struct GatewaySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub api: GatewayApi<SqliteDatabase, SqliteDatabase>,
    pub endpoint: MerchantEndpoint,
}

/// What the merchant's callback URL will answer, and the URLs it has been asked for so far.
#[derive(Debug, Clone)]
pub struct MerchantEndpoint {
    script: Arc<Mutex<VecDeque<CallbackResponse>>>,
    then: CallbackResponse,
    sent: Arc<Mutex<Vec<String>>>,
}

impl MerchantEndpoint {
    pub fn new(responses: Vec<CallbackResponse>, then: CallbackResponse) -> Self {
        Self { script: Arc::new(Mutex::new(responses.into())), then, sent: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn requests(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// A callback client that answers from the script, falling back to `then` once the script runs out.
    pub fn client(&self) -> MockCallbackClient {
        let endpoint = self.clone();
        let mut client = MockCallbackClient::new();
        client.expect_get().returning(move |url| {
            endpoint.sent.lock().unwrap().push(url.to_string());
            let next = endpoint.script.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| endpoint.then.clone()))
        });
        client
    }
}

impl GatewayWorld {
    pub fn system(&self) -> &GatewaySystem {
        self.system.as_ref().expect("Gateway system not initialised")
    }

    pub fn api(&self) -> &GatewayApi<SqliteDatabase, SqliteDatabase> {
        &self.system().api
    }

    pub async fn gateway(&self, name: &str) -> Gateway {
        self.system().db.find_by_name(name).await.expect("Gateway does not exist")
    }

    pub fn last_order(&self) -> &Order {
        match &self.last_result {
            Some(Ok(order)) => order,
            Some(Err(e)) => panic!("The last order request failed: {e}"),
            None => panic!("No order has been requested"),
        }
    }

    /// Queues up the responses the merchant endpoint will give, replacing any existing script.
    pub fn script_endpoint(&mut self, responses: Vec<CallbackResponse>, then: CallbackResponse) {
        if let Some(system) = self.system.as_mut() {
            system.endpoint = MerchantEndpoint::new(responses, then);
        }
    }

    pub fn dispatcher(&self) -> CallbackDispatcher<SqliteDatabase, MockCallbackClient> {
        let system = self.system();
        let policy = RetryPolicy::with_delay(Duration::from_millis(5));
        CallbackDispatcher::new(system.db.clone(), system.endpoint.client(), policy)
    }
}

impl GatewaySystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let api = GatewayApi::new(db.clone(), db.clone(), EventProducers::default());
        let endpoint = MerchantEndpoint::new(vec![], CallbackResponse::new("200", "OK"));
        Self { db_path: url, db, api, endpoint }
    }
}
