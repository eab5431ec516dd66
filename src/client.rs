//! Redirect-following test client.
//!
//! [`TestClient`] wraps a [`RequestDispatcher`] and adds bounded redirect
//! following, hop counting, browsing history and the captured response that
//! the assertion helpers read.

use std::sync::LazyLock;

use url::Url;

use crate::assertions::{self, JsonShape};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::history::History;
use crate::http::{CapturedResponse, RequestContext, RequestDispatcher};
use crate::redirect::{RedirectPolicy, RedirectState, resolve_location};

static DEFAULT_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost").expect("default base URL is valid"));

/// Build a [`TestClient`] around an actix-web `App`.
///
/// Usage: `let mut client = test_client!(App::new().configure(routes));`
#[macro_export]
macro_rules! test_client {
    ($app:expr) => {
        $crate::client::TestClient::new($crate::http::ActixDispatcher::new(
            actix_web::test::init_service($app).await,
        ))
    };
}

pub struct TestClient<D> {
    dispatcher: D,
    base_url: Url,
    policy: RedirectPolicy,
    state: RedirectState,
    response: Option<CapturedResponse>,
    history: History,
}

impl<D> TestClient<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher,
            base_url: DEFAULT_BASE_URL.clone(),
            policy: RedirectPolicy::default(),
            state: RedirectState::default(),
            response: None,
            history: History::default(),
        }
    }

    /// Build a client with the redirect settings and base URL from `config`.
    pub fn from_config(dispatcher: D, config: &HarnessConfig) -> HarnessResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| HarnessError::InvalidUri {
            uri: config.base_url.clone(),
            message: e.to_string(),
        })?;
        let mut client = Self::new(dispatcher);
        client.base_url = base_url;
        client.policy = RedirectPolicy::from(&config.redirect);
        Ok(client)
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.policy
    }

    /// `None` disables redirect following; `Some(n)` follows at most `n` hops.
    pub fn set_max_redirects(&mut self, max_hops: Option<u32>) -> &mut Self {
        self.policy.max_hops = max_hops;
        self
    }

    pub fn enable_redirects(&mut self, max_hops: u32) -> &mut Self {
        self.set_max_redirects(Some(max_hops))
    }

    pub fn disable_redirects(&mut self) -> &mut Self {
        self.set_max_redirects(None)
    }

    pub fn max_redirects(&self) -> Option<u32> {
        self.policy.max_hops
    }

    pub fn set_raise_on_exceed(&mut self, raise: bool) -> &mut Self {
        self.policy.raise_on_exceed = raise;
        self
    }

    pub fn raises_on_exceed(&self) -> bool {
        self.policy.raise_on_exceed
    }

    pub fn set_reset_count_on_next_call(&mut self, reset: bool) -> &mut Self {
        self.policy.reset_count_on_next_call = reset;
        self
    }

    pub fn resets_count_on_next_call(&self) -> bool {
        self.policy.reset_count_on_next_call
    }

    pub fn hops_followed(&self) -> u32 {
        self.state.hops_followed
    }

    pub fn set_hops_followed(&mut self, hops: u32) {
        self.state.hops_followed = hops;
    }

    pub fn increment_hops(&mut self) {
        self.state.record_hop();
    }

    pub fn response(&self) -> Option<&CapturedResponse> {
        self.response.as_ref()
    }

    /// Replace the captured response, e.g. to assert against a hand-built one.
    pub fn set_response(&mut self, response: CapturedResponse) {
        self.response = Some(response);
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn captured(&self) -> &CapturedResponse {
        self.response
            .as_ref()
            .expect("no response captured; issue a request before asserting")
    }

    pub fn assert_status(&self, expected: u16) -> &Self {
        assertions::assert_status(self.captured(), expected);
        self
    }

    pub fn assert_header(&self, name: &str, expected: Option<&str>) -> &Self {
        assertions::assert_header(self.captured(), name, expected);
        self
    }

    pub fn assert_json_structure(&self, shape: &JsonShape) -> &Self {
        assertions::assert_json_structure(self.captured(), shape);
        self
    }
}

impl<D: RequestDispatcher> TestClient<D> {
    pub async fn get(&mut self, uri: &str) -> HarnessResult<&CapturedResponse> {
        self.call(RequestContext::get(uri)).await
    }

    pub async fn post(&mut self, uri: &str) -> HarnessResult<&CapturedResponse> {
        self.call(RequestContext::post(uri)).await
    }

    pub async fn put(&mut self, uri: &str) -> HarnessResult<&CapturedResponse> {
        self.call(RequestContext::put(uri)).await
    }

    pub async fn delete(&mut self, uri: &str) -> HarnessResult<&CapturedResponse> {
        self.call(RequestContext::delete(uri)).await
    }

    pub async fn patch(&mut self, uri: &str) -> HarnessResult<&CapturedResponse> {
        self.call(RequestContext::patch(uri)).await
    }

    /// Verb entry point: every call starts with a fresh hop counter.
    pub async fn call(&mut self, ctx: RequestContext) -> HarnessResult<&CapturedResponse> {
        self.policy.reset_count_on_next_call = true;
        self.request(ctx).await
    }

    /// Issue one logical request, following redirects per the current policy.
    ///
    /// The hop counter is zeroed first only when `reset_count_on_next_call` is
    /// set. The previous response is dropped up front and every response is
    /// captured as it arrives, so on any error the captured response is the
    /// last one this request received (or none).
    pub async fn request(&mut self, ctx: RequestContext) -> HarnessResult<&CapturedResponse> {
        let response = self.follow(ctx).await?;
        Ok(self.response.insert(response))
    }

    async fn follow(&mut self, ctx: RequestContext) -> HarnessResult<CapturedResponse> {
        if self.policy.reset_count_on_next_call {
            self.state.reset();
        }
        self.response = None;

        let mut response = self.dispatch_recorded(&ctx).await?;
        let mut current = ctx;

        while self.policy.allows_hop(self.state.hops_followed) && response.is_redirect() {
            let Some(location) = response.location() else {
                break;
            };
            let target = resolve_location(&self.base_url, &current.uri, location)?;
            self.state.record_hop();
            log::debug!(
                "Following redirect {} -> {} (hop {}/{})",
                current.uri,
                target,
                self.state.hops_followed,
                self.policy.max_hops.unwrap_or_default()
            );

            let next = current.redirect_to(target);
            response = self.dispatch_recorded(&next).await?;
            current = next;
        }

        if self.policy.is_following() && response.is_redirect() {
            log::warn!(
                "Redirect limit reached after {} hop(s) at {}",
                self.state.hops_followed,
                current.uri
            );
            if self.policy.raise_on_exceed {
                return Err(HarnessError::MaxRedirectExceeded {
                    hops: self.state.hops_followed,
                    uri: current.uri,
                });
            }
        }

        Ok(response)
    }

    /// Re-issue the previous history entry without recording it again.
    /// The history cursor only moves once the request succeeds.
    pub async fn back(&mut self) -> HarnessResult<&CapturedResponse> {
        let ctx = self
            .history
            .peek_back()
            .cloned()
            .ok_or_else(|| HarnessError::History("no previous request".to_string()))?;
        let response = self.replay(ctx).await?;
        self.history.back();
        Ok(self.response.insert(response))
    }

    pub async fn forward(&mut self) -> HarnessResult<&CapturedResponse> {
        let ctx = self
            .history
            .peek_forward()
            .cloned()
            .ok_or_else(|| HarnessError::History("no next request".to_string()))?;
        let response = self.replay(ctx).await?;
        self.history.forward();
        Ok(self.response.insert(response))
    }

    pub async fn reload(&mut self) -> HarnessResult<&CapturedResponse> {
        let ctx = self
            .history
            .current()
            .cloned()
            .ok_or_else(|| HarnessError::History("nothing to reload".to_string()))?;
        let response = self.replay(ctx).await?;
        Ok(self.response.insert(response))
    }

    async fn replay(&mut self, ctx: RequestContext) -> HarnessResult<CapturedResponse> {
        self.policy.reset_count_on_next_call = true;
        self.follow(ctx.without_history()).await
    }

    /// Dispatch one hop, then record it in history and capture its response.
    async fn dispatch_recorded(&mut self, ctx: &RequestContext) -> HarnessResult<CapturedResponse> {
        let response = self.dispatcher.dispatch(ctx).await?;
        if ctx.update_history {
            self.history.push(ctx.clone());
        }
        self.response = Some(response.clone());
        Ok(response)
    }
}
