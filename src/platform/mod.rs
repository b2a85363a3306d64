//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Fetching the creature catalog
//! - Posting results to the hosting site (with its CSRF token)

use crate::error::GameError;

/// Endpoint that stores a finished game on the hosting site
pub const SAVE_RESULT_PATH: &str = "/save_game_result/";
/// Header carrying the anti-forgery token
pub const CSRF_HEADER: &str = "X-CSRFToken";
/// Cookie the hosting site stores the token in
pub const CSRF_COOKIE: &str = "csrftoken";

/// Unix time in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Extract the CSRF token from a `document.cookie` string
pub fn parse_csrf_cookie(cookies: &str) -> Option<String> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Treat any failure while fetching creatures as the source being unavailable
pub fn as_source_error(e: GameError) -> GameError {
    match e {
        GameError::SourceUnavailable(_) => e,
        other => GameError::SourceUnavailable(other.to_string()),
    }
}

#[cfg(target_arch = "wasm32")]
pub mod web {
    use std::rc::Rc;

    use rand::Rng;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{CSRF_HEADER, as_source_error, parse_csrf_cookie};
    use crate::cards::catalog::{self, CATALOG_URL};
    use crate::cards::creature::fallback_replacement;
    use crate::cards::Creature;
    use crate::error::{GameError, Result};
    use crate::report::{GameResult, ReportOutcome, ResultReporter};

    fn js_error(value: JsValue) -> String {
        value
            .as_string()
            .unwrap_or_else(|| format!("{value:?}"))
    }

    async fn fetch_text(request: Request) -> std::result::Result<String, String> {
        let window = web_sys::window().ok_or("no window")?;
        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let response: Response = value.dyn_into().map_err(js_error)?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        let body = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        body.as_string().ok_or_else(|| "response body is not text".to_string())
    }

    async fn get_text(url: &str) -> Result<String> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);
        let request = Request::new_with_str_and_init(url, &opts)
            .map_err(|e| GameError::SourceUnavailable(js_error(e)))?;
        fetch_text(request).await.map_err(GameError::SourceUnavailable)
    }

    async fn post_json(url: &str, body: &str, csrf_token: Option<&str>) -> Result<String> {
        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::SameOrigin);
        opts.set_body(&JsValue::from_str(body));
        let request = Request::new_with_str_and_init(url, &opts)
            .map_err(|e| GameError::Reporting(js_error(e)))?;
        let headers = request.headers();
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| GameError::Reporting(js_error(e)))?;
        if let Some(token) = csrf_token {
            headers
                .set(CSRF_HEADER, token)
                .map_err(|e| GameError::Reporting(js_error(e)))?;
        }
        fetch_text(request).await.map_err(GameError::Reporting)
    }

    /// CSRF token of the hosting page
    pub fn csrf_token() -> Option<String> {
        let document = web_sys::window()?.document()?;
        let html: web_sys::HtmlDocument = document.dyn_into().ok()?;
        parse_csrf_cookie(&html.cookie().ok()?)
    }

    /// Fetch `count` random creatures from the remote catalog
    ///
    /// A creature whose details fail to load is replaced by an unused
    /// fallback creature.
    pub async fn fetch_creatures<R: Rng>(count: usize, rng: &mut R) -> Result<Vec<Creature>> {
        log::info!("Loading creatures from the catalog...");
        let listing = get_text(CATALOG_URL).await?;
        let entries = catalog::parse_catalog(&listing).map_err(as_source_error)?;
        let picked = catalog::pick_entries(&entries, count, rng);

        let mut creatures: Vec<Creature> = Vec::with_capacity(count);
        for entry in picked {
            let fetched = match get_text(&entry.url).await {
                Ok(json) => catalog::parse_creature(&json),
                Err(e) => Err(e),
            };
            match fetched {
                Ok(creature) if creatures.iter().all(|c| c.id != creature.id) => {
                    creatures.push(creature)
                }
                Ok(_) | Err(_) => {
                    log::warn!("Could not load '{}', substituting a fallback", entry.name);
                    if let Some(replacement) = fallback_replacement(&creatures) {
                        creatures.push(replacement);
                    }
                }
            }
        }
        log::info!("Loaded {} creatures", creatures.len());
        Ok(creatures)
    }

    /// Reports results to the hosting site; the outcome arrives asynchronously
    pub struct HttpReporter {
        endpoint: String,
        on_outcome: Rc<dyn Fn(ReportOutcome)>,
    }

    impl HttpReporter {
        pub fn new(endpoint: impl Into<String>, on_outcome: Rc<dyn Fn(ReportOutcome)>) -> Self {
            Self {
                endpoint: endpoint.into(),
                on_outcome,
            }
        }
    }

    impl ResultReporter for HttpReporter {
        fn report(&mut self, result: &GameResult) -> Result<Option<ReportOutcome>> {
            let body = result.to_json()?;
            let token = csrf_token();
            if token.is_none() {
                log::warn!("No CSRF token found, the server may reject the result");
            }
            let endpoint = self.endpoint.clone();
            let on_outcome = self.on_outcome.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = match post_json(&endpoint, &body, token.as_deref()).await {
                    Ok(text) => ReportOutcome::from_json(&text),
                    Err(e) => Err(e),
                };
                match outcome {
                    Ok(outcome) => {
                        log::info!("Result saved: {:+} trophies", outcome.trophies_earned);
                        on_outcome(outcome);
                    }
                    Err(e) => log::warn!("Failed to save game result: {e}"),
                }
            });
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csrf_cookie() {
        let cookies = "sessionid=abc; csrftoken=T0k3n; theme=dark";
        assert_eq!(parse_csrf_cookie(cookies).as_deref(), Some("T0k3n"));
        assert_eq!(parse_csrf_cookie("sessionid=abc"), None);
        assert_eq!(parse_csrf_cookie("csrftoken="), None);
        assert_eq!(parse_csrf_cookie(""), None);
    }

    #[test]
    fn test_source_errors_normalised() {
        let e = as_source_error(GameError::InvalidInput("x".into()));
        assert!(matches!(e, GameError::SourceUnavailable(_)));
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000.0);
    }
}
