//! Username to identifier resolution.
//!
//! Drives a [`Backend`] through the profile search page: find the search box,
//! type the username, follow the best suggestion, and read the identifier from
//! the URL the browser ends up on. Every failure is logged and folded into
//! [`ResolutionResult::failed`].

use super::candidate::{Candidate, pick_candidate};
use super::result::{ResolutionResult, ResolveError};
use crate::backend::Backend;
use crate::config::{Diagnostics, ResolverConfig};
use futures::FutureExt;
use hintswap_common::grammar::{GrammarError, ProfileUrlGrammar};
use hintswap_common::protocol::{ElementHandle, Key, Locator};
use std::fmt;
use std::panic::AssertUnwindSafe;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView(true);";
const FOCUS: &str = "arguments[0].focus();";
const SCRIPTED_CLICK: &str = "arguments[0].click();";

/// How the browser was moved off the search page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Navigation {
    /// Navigated straight to the chosen profile link.
    Direct,
    /// Left to the page itself, after a scripted click or the Enter key.
    Pending { chose_candidate: bool },
}

pub struct ResolutionEngine {
    config: ResolverConfig,
    grammar: ProfileUrlGrammar,
}

impl ResolutionEngine {
    pub fn new(config: ResolverConfig) -> Result<Self, GrammarError> {
        let grammar = ProfileUrlGrammar::new(&config.profile_base_url)?;
        Ok(Self { config, grammar })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn grammar(&self) -> &ProfileUrlGrammar {
        &self.grammar
    }

    /// Resolve `username` to an account identifier.
    ///
    /// Owns the backend session for the whole call: it is launched here and
    /// closed on every exit path, including a failed launch. Launch and the
    /// search share the overall deadline and the panic guard.
    pub async fn resolve<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        username: &str,
    ) -> ResolutionResult {
        let outcome = self
            .guarded(async {
                backend.launch().await.map_err(ResolveError::SessionStart)?;
                self.run(backend, username).await
            })
            .await;

        self.close_session(backend).await;

        match outcome {
            Ok(identifier) => {
                self.narrate(format_args!("Resolved '{}' to {}", username, identifier));
                ResolutionResult::resolved(identifier).unwrap_or_else(ResolutionResult::failed)
            }
            Err(e) => {
                warn!(code = e.code(), username, "Resolution failed: {}", e);
                ResolutionResult::failed()
            }
        }
    }

    /// Run `work` under the overall deadline, turning panics into errors.
    async fn guarded<F>(&self, work: F) -> Result<String, ResolveError>
    where
        F: Future<Output = Result<String, ResolveError>>,
    {
        let work = AssertUnwindSafe(work).catch_unwind();
        let outcome = match self.config.overall_timeout() {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| ResolveError::DeadlineExceeded(limit))?,
            None => work.await,
        };
        outcome.unwrap_or(Err(ResolveError::Panicked))
    }

    /// Close the session under its own limit. Teardown faults are only logged.
    async fn close_session<B: Backend + ?Sized>(&self, backend: &mut B) {
        let limit = self.config.close_timeout();
        let close = AssertUnwindSafe(backend.close()).catch_unwind();
        match tokio::time::timeout(limit, close).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => warn!(code = e.code(), "Failed to close browser session: {}", e),
            Ok(Err(_)) => warn!("Backend panicked while closing the browser session"),
            Err(_) => warn!("Browser session did not close within {:?}", limit),
        }
    }

    async fn run<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        username: &str,
    ) -> Result<String, ResolveError> {
        self.narrate(format_args!("Navigating to {}", self.config.search_url));
        backend.navigate(&self.config.search_url).await?;

        let input = self.locate_search_input(backend).await?;
        self.submit_query(backend, input, username).await?;

        self.narrate(format_args!("Waiting for suggestions"));
        sleep(self.config.suggestion_settle()).await;

        let navigation = self.select_candidate(backend, input, username).await;
        self.confirm_navigation(backend, navigation).await;

        let url = backend.current_url().await?;
        match self.grammar.extract(&url) {
            Some(identifier) => Ok(identifier),
            None if navigation == (Navigation::Pending { chose_candidate: false }) => {
                Err(ResolveError::NoCandidate { url })
            }
            None => Err(ResolveError::ExtractionMismatch { url }),
        }
    }

    async fn locate_search_input<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
    ) -> Result<ElementHandle, ResolveError> {
        let timeout = self.config.locate_timeout();
        let mut tried = Vec::with_capacity(self.config.locators.len());

        for locator in &self.config.locators {
            match backend.find_element(locator, timeout).await {
                Ok(Some(handle)) => {
                    self.narrate(format_args!("Found search input using {}", locator));
                    return Ok(handle);
                }
                Ok(None) => debug!("No search input for {} within {:?}", locator, timeout),
                Err(e) => debug!("Locator {} failed: {}", locator, e),
            }
            tried.push(locator.to_string());
        }

        Err(ResolveError::LocatorNotFound { tried })
    }

    async fn submit_query<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        input: ElementHandle,
        username: &str,
    ) -> Result<(), ResolveError> {
        if let Err(e) = backend.execute_script(SCROLL_INTO_VIEW, Some(input)).await {
            debug!("Could not scroll search input into view: {}", e);
        }
        sleep(self.config.scroll_settle()).await;

        self.narrate(format_args!("Entering username '{}'", username));
        backend.clear(input).await?;
        if let Err(e) = backend.click(input).await {
            // Overlays commonly intercept the click.
            debug!("Click on search input failed, focusing by script: {}", e);
            backend.execute_script(FOCUS, Some(input)).await?;
        }
        sleep(self.config.focus_settle()).await;

        backend.send_keys(input, username).await?;
        Ok(())
    }

    async fn select_candidate<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        input: ElementHandle,
        username: &str,
    ) -> Navigation {
        let selector = Locator::css(self.config.candidate_selector.clone());
        let links = match backend.find_all(&selector).await {
            Ok(links) => links,
            Err(e) => {
                debug!("Suggestion scan failed: {}", e);
                Vec::new()
            }
        };

        let Some(&first_link) = links.first() else {
            self.narrate(format_args!("No suggestions found, submitting with Enter"));
            self.press_confirm(backend, input).await;
            return Navigation::Pending {
                chose_candidate: false,
            };
        };

        let candidates = self.read_candidates(backend, &links).await;
        self.narrate(format_args!(
            "Found {} suggestion link(s), {} with a readable href",
            links.len(),
            candidates.len()
        ));

        if let Some(chosen) = pick_candidate(&candidates, username, &self.grammar) {
            self.narrate(format_args!("Navigating directly to {}", chosen.href));
            return match backend.navigate(&chosen.href).await {
                Ok(_) => Navigation::Direct,
                Err(e) => {
                    warn!(code = e.code(), "Direct navigation to {} failed: {}", chosen.href, e);
                    self.scripted_click(backend, chosen.element, input).await;
                    Navigation::Pending {
                        chose_candidate: true,
                    }
                }
            };
        }

        self.narrate(format_args!(
            "No profile link among suggestions, clicking the first one"
        ));
        self.scripted_click(backend, first_link, input).await;
        Navigation::Pending {
            chose_candidate: false,
        }
    }

    async fn read_candidates<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        links: &[ElementHandle],
    ) -> Vec<Candidate> {
        let mut candidates = Vec::with_capacity(links.len());
        for &element in links {
            match backend.attribute(element, "href").await {
                Ok(Some(href)) => candidates.push(Candidate { element, href }),
                Ok(None) => {}
                Err(e) => debug!("Could not read href of link {}: {}", element, e),
            }
        }
        candidates
    }

    /// Click through the page's own script context, which is not blocked by
    /// overlays. Falls back to Enter on the search input.
    async fn scripted_click<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        link: ElementHandle,
        input: ElementHandle,
    ) {
        if let Err(e) = backend.execute_script(SCRIPTED_CLICK, Some(link)).await {
            debug!("Scripted click on {} failed, submitting with Enter: {}", link, e);
            self.press_confirm(backend, input).await;
        }
    }

    async fn press_confirm<B: Backend + ?Sized>(&self, backend: &mut B, input: ElementHandle) {
        if let Err(e) = backend.press_key(input, Key::Enter).await {
            warn!(code = e.code(), "Could not submit search with Enter: {}", e);
        }
    }

    async fn confirm_navigation<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        navigation: Navigation,
    ) {
        if navigation == Navigation::Direct {
            sleep(self.config.navigation_settle()).await;
            return;
        }

        let timeout = self.config.confirm_timeout();
        let deadline = Instant::now() + timeout;
        loop {
            match backend.current_url().await {
                Ok(url) if self.grammar.matches(&url) => {
                    self.narrate(format_args!("Landed on {}", url));
                    sleep(self.config.confirm_settle()).await;
                    return;
                }
                Ok(_) => {}
                Err(e) => debug!("Could not read current URL: {}", e),
            }

            let now = Instant::now();
            if now >= deadline {
                let e = ResolveError::NavigationTimeout(timeout);
                warn!(code = e.code(), "{}, extracting from the current page anyway", e);
                return;
            }
            sleep(self.config.poll_interval().min(deadline - now)).await;
        }
    }

    fn narrate(&self, message: fmt::Arguments<'_>) {
        match self.config.diagnostics {
            Diagnostics::Narrated => info!("{}", message),
            Diagnostics::Quiet => debug!("{}", message),
        }
    }
}
