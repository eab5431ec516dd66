//! A test fixture composing the client with a database pool.

use crate::assertions::{self, JsonShape};
use crate::client::TestClient;
use crate::config::HarnessConfig;
use crate::db::{self, Condition, DbConnection, DbPool};
use crate::error::{HarnessError, HarnessResult};
use crate::http::{CapturedResponse, RequestContext, RequestDispatcher};

/// Controller test fixture: requests go through the client, database
/// assertions through the pool. Every method returns the fixture so checks
/// chain after a request.
pub struct ControllerFixture<D> {
    client: TestClient<D>,
    pool: Option<DbPool>,
}

impl<D> ControllerFixture<D> {
    pub fn new(client: TestClient<D>) -> Self {
        Self { client, pool: None }
    }

    /// Build the client from `config` and open a pool when a database URL is set.
    pub fn from_config(dispatcher: D, config: &HarnessConfig) -> HarnessResult<Self> {
        let client = TestClient::from_config(dispatcher, config)?;
        let pool = match config.database_url.as_deref() {
            Some(url) => Some(db::initialize_db_pool(url, config.pool.max_size)?),
            None => None,
        };
        Ok(Self { client, pool })
    }

    pub fn with_pool(mut self, pool: DbPool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn client(&self) -> &TestClient<D> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut TestClient<D> {
        &mut self.client
    }

    pub fn pool(&self) -> Option<&DbPool> {
        self.pool.as_ref()
    }

    pub fn response(&self) -> Option<&CapturedResponse> {
        self.client.response()
    }

    pub fn hops_followed(&self) -> u32 {
        self.client.hops_followed()
    }

    pub fn connection(&self) -> HarnessResult<DbConnection> {
        let pool = self.pool.as_ref().ok_or(HarnessError::NoDatabase)?;
        Ok(pool.get()?)
    }

    fn connection_or_panic(&self) -> DbConnection {
        match self.connection() {
            Ok(conn) => conn,
            Err(e) => panic!("database assertion needs a connection: {}", e),
        }
    }

    pub fn assert_status(&self, expected: u16) -> &Self {
        self.client.assert_status(expected);
        self
    }

    pub fn assert_header(&self, name: &str, expected: Option<&str>) -> &Self {
        self.client.assert_header(name, expected);
        self
    }

    pub fn assert_json_structure(&self, shape: &JsonShape) -> &Self {
        self.client.assert_json_structure(shape);
        self
    }

    pub fn assert_row_count(&self, table: &str, expected: i64, condition: impl Into<Condition>) -> &Self {
        let mut conn = self.connection_or_panic();
        assertions::assert_row_count(&mut conn, table, expected, condition);
        self
    }

    pub fn assert_row_exists(&self, table: &str, condition: impl Into<Condition>) -> &Self {
        let mut conn = self.connection_or_panic();
        assertions::assert_row_exists(&mut conn, table, condition);
        self
    }
}

impl<D: RequestDispatcher> ControllerFixture<D> {
    pub async fn get(&mut self, uri: &str) -> HarnessResult<&mut Self> {
        self.client.get(uri).await?;
        Ok(self)
    }

    pub async fn post(&mut self, uri: &str) -> HarnessResult<&mut Self> {
        self.client.post(uri).await?;
        Ok(self)
    }

    pub async fn put(&mut self, uri: &str) -> HarnessResult<&mut Self> {
        self.client.put(uri).await?;
        Ok(self)
    }

    pub async fn delete(&mut self, uri: &str) -> HarnessResult<&mut Self> {
        self.client.delete(uri).await?;
        Ok(self)
    }

    pub async fn patch(&mut self, uri: &str) -> HarnessResult<&mut Self> {
        self.client.patch(uri).await?;
        Ok(self)
    }

    pub async fn call(&mut self, ctx: RequestContext) -> HarnessResult<&mut Self> {
        self.client.call(ctx).await?;
        Ok(self)
    }
}
