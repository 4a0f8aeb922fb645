use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::{Client, CustomRedisError};

/// Hand-rolled stub client for tests.
///
/// Reads (`get`) default to `NotFound`, writes default to success and
/// `set_nx_ex`/`del_if_eq` to `Ok(true)`, so tests only prime the keys they
/// constrain. Every call is recorded and retrievable via `get_calls()`.
#[derive(Clone, Default)]
pub struct MockRedisClient {
    get_ret: HashMap<String, Result<String, CustomRedisError>>,
    set_ret: HashMap<String, Result<(), CustomRedisError>>,
    setex_ret: HashMap<String, Result<(), CustomRedisError>>,
    set_nx_ex_ret: HashMap<String, Result<bool, CustomRedisError>>,
    del_ret: HashMap<String, Result<(), CustomRedisError>>,
    del_if_eq_ret: HashMap<String, Result<bool, CustomRedisError>>,
    calls: Arc<Mutex<Vec<MockRedisCall>>>,
}

impl MockRedisClient {
    pub fn new() -> Self {
        Self::default()
    }

    // Helper method to safely lock the calls mutex
    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockRedisCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get_ret(&mut self, key: &str, ret: Result<String, CustomRedisError>) -> Self {
        self.get_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn set_ret(&mut self, key: &str, ret: Result<(), CustomRedisError>) -> Self {
        self.set_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn setex_ret(&mut self, key: &str, ret: Result<(), CustomRedisError>) -> Self {
        self.setex_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn set_nx_ex_ret(&mut self, key: &str, ret: Result<bool, CustomRedisError>) -> Self {
        self.set_nx_ex_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn del_ret(&mut self, key: &str, ret: Result<(), CustomRedisError>) -> Self {
        self.del_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn del_if_eq_ret(&mut self, key: &str, ret: Result<bool, CustomRedisError>) -> Self {
        self.del_if_eq_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn get_calls(&self) -> Vec<MockRedisCall> {
        self.lock_calls().clone()
    }
}

#[derive(Debug, Clone)]
pub enum MockRedisValue {
    None,
    String(String),
    StringWithTTL(String, u64),
}

#[derive(Debug, Clone)]
pub struct MockRedisCall {
    pub op: String,
    pub key: String,
    pub value: MockRedisValue,
}

#[async_trait]
impl Client for MockRedisClient {
    async fn get(&self, key: String) -> Result<String, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "get".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        match self.get_ret.get(&key) {
            Some(result) => result.clone(),
            None => Err(CustomRedisError::NotFound),
        }
    }

    async fn set(&self, key: String, value: String) -> Result<(), CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "set".to_string(),
            key: key.clone(),
            value: MockRedisValue::String(value),
        });

        self.set_ret.get(&key).cloned().unwrap_or(Ok(()))
    }

    async fn setex(
        &self,
        key: String,
        value: String,
        seconds: u64,
    ) -> Result<(), CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "setex".to_string(),
            key: key.clone(),
            value: MockRedisValue::StringWithTTL(value, seconds),
        });

        self.setex_ret.get(&key).cloned().unwrap_or(Ok(()))
    }

    async fn set_nx_ex(
        &self,
        key: String,
        value: String,
        seconds: u64,
    ) -> Result<bool, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "set_nx_ex".to_string(),
            key: key.clone(),
            value: MockRedisValue::StringWithTTL(value, seconds),
        });

        self.set_nx_ex_ret.get(&key).cloned().unwrap_or(Ok(true))
    }

    async fn del(&self, key: String) -> Result<(), CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "del".to_string(),
            key: key.clone(),
            value: MockRedisValue::None,
        });

        self.del_ret.get(&key).cloned().unwrap_or(Ok(()))
    }

    async fn del_if_eq(&self, key: String, value: String) -> Result<bool, CustomRedisError> {
        self.lock_calls().push(MockRedisCall {
            op: "del_if_eq".to_string(),
            key: key.clone(),
            value: MockRedisValue::String(value),
        });

        self.del_if_eq_ret.get(&key).cloned().unwrap_or(Ok(true))
    }
}
