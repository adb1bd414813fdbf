//! OAuth2 device-code sign-in against a Microsoft identity platform style
//! authority, plus silent renewal through refresh tokens.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use super::cache::{unix_now, Credential, TokenCache};
use super::TokenAcquirer;
use crate::config::Settings;
use crate::error::BboxerError;
use crate::interrupt::Interrupt;

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);
const WAIT_SLICE: Duration = Duration::from_millis(100);

fn default_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// What to do after a device-code poll that returned no access token.
#[derive(Debug, PartialEq, Eq)]
enum PollStep {
    Pending,
    SlowDown,
    Failed(String),
}

impl TokenResponse {
    fn poll_step(&self) -> PollStep {
        match self.error.as_deref() {
            Some("authorization_pending") => PollStep::Pending,
            Some("slow_down") => PollStep::SlowDown,
            _ => PollStep::Failed(
                self.error_description
                    .clone()
                    .or_else(|| self.error.clone())
                    .unwrap_or_else(|| "no access token returned".to_string()),
            ),
        }
    }
}

/// Acquires tokens with the device-code grant; renews with refresh tokens.
pub struct DeviceCodeAcquirer {
    agent: ureq::Agent,
    client_id: String,
    authority: String,
    scope: String,
    interrupt: Interrupt,
}

impl DeviceCodeAcquirer {
    pub fn new(agent: ureq::Agent, settings: &Settings, interrupt: Interrupt) -> Self {
        let mut scopes = settings.scopes.clone();
        scopes.push("offline_access".to_string());
        Self {
            agent,
            client_id: settings.client_id.clone(),
            authority: settings.authority.trim_end_matches('/').to_string(),
            scope: scopes.join(" "),
            interrupt,
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/oauth2/v2.0/{}", self.authority, name)
    }

    fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, BboxerError> {
        let fail =
            |message: String| BboxerError::AuthenticationFailed(format!("{url}: {message}"));
        let mut response = self
            .agent
            .post(url)
            .send_form(form.iter().copied())
            .map_err(|e| fail(e.to_string()))?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| fail(e.to_string()))
    }

    fn credential(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<u64>,
    ) -> Credential {
        Credential {
            client_id: self.client_id.clone(),
            authority: self.authority.clone(),
            access_token,
            refresh_token,
            expires_at: unix_now() + expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS),
        }
    }

    /// Sleeps for `duration`, returning early with `Interrupted` on Ctrl-C.
    fn wait(&self, duration: Duration) -> Result<(), BboxerError> {
        let until = Instant::now() + duration;
        loop {
            if self.interrupt.is_raised() {
                return Err(BboxerError::Interrupted);
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep((until - now).min(WAIT_SLICE));
        }
    }
}

impl TokenAcquirer for DeviceCodeAcquirer {
    fn acquire_silent(&self, cache: &mut TokenCache) -> Option<String> {
        let cached = cache.find(&self.client_id, &self.authority)?.clone();
        if cached.is_fresh(unix_now()) {
            debug!("using cached access token");
            return Some(cached.access_token);
        }

        let refresh_token = cached.refresh_token?;
        let response: TokenResponse = match self.post_form(
            &self.endpoint("token"),
            &[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("scope", self.scope.as_str()),
            ],
        ) {
            Ok(response) => response,
            Err(err) => {
                debug!("token refresh failed: {err}");
                return None;
            }
        };

        let Some(access_token) = response.access_token else {
            debug!(error = ?response.error, "token refresh rejected");
            return None;
        };
        debug!("access token refreshed");
        let refresh_token = response.refresh_token.or(Some(refresh_token));
        cache.store(self.credential(access_token.clone(), refresh_token, response.expires_in));
        Some(access_token)
    }

    fn acquire_interactive(&self, cache: &mut TokenCache) -> Result<String, BboxerError> {
        let code: DeviceCodeResponse = self.post_form(
            &self.endpoint("devicecode"),
            &[
                ("client_id", self.client_id.as_str()),
                ("scope", self.scope.as_str()),
            ],
        )?;

        // The user acts on this out of band; keep it off stdout.
        match &code.message {
            Some(message) => eprintln!("{message}"),
            None => eprintln!(
                "To sign in, open {} and enter the code {}",
                code.verification_uri, code.user_code
            ),
        }
        info!("waiting for device sign-in");

        let deadline = Instant::now() + Duration::from_secs(code.expires_in);
        let mut interval = Duration::from_secs(code.interval);
        loop {
            self.wait(interval)?;
            if Instant::now() >= deadline {
                return Err(BboxerError::AuthenticationFailed(
                    "sign-in code expired".to_string(),
                ));
            }

            let mut response: TokenResponse = self.post_form(
                &self.endpoint("token"),
                &[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", self.client_id.as_str()),
                    ("device_code", code.device_code.as_str()),
                ],
            )?;

            if let Some(access_token) = response.access_token.take() {
                cache.store(self.credential(
                    access_token.clone(),
                    response.refresh_token,
                    response.expires_in,
                ));
                return Ok(access_token);
            }

            match response.poll_step() {
                PollStep::Pending => {}
                PollStep::SlowDown => {
                    debug!("identity provider asked to poll slower");
                    interval += SLOW_DOWN_STEP;
                }
                PollStep::Failed(reason) => return Err(BboxerError::AuthenticationFailed(reason)),
            }
        }
    }
}
