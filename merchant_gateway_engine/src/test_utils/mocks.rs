use mockall::mock;

use crate::{
    db_types::CallbackResponse,
    traits::{CallbackClient, CallbackClientError},
};

mock! {
    pub CallbackClient {}
    impl Clone for CallbackClient {
        fn clone(&self) -> Self;
    }
    impl CallbackClient for CallbackClient {
        async fn get(&self, url: &str) -> Result<CallbackResponse, CallbackClientError>;
    }
}
