//! Resolution protocol tests against a scripted in-memory page.
//!
//! Time is paused, so locator timeouts and settling delays elapse instantly.

use async_trait::async_trait;
use hintswap_engine::backend::{Backend, BackendError};
use hintswap_engine::config::{Diagnostics, ResolverConfig};
use hintswap_engine::protocol::{ElementHandle, Key, Locator, NavigationResult};
use hintswap_engine::resolution::{ResolutionEngine, ResolutionResult};

const SEARCH_URL: &str = "https://stats.cc/siege";
const ID: &str = "934e0849-2c26-4067-a66a-7636c152d0e5";
const INPUT: ElementHandle = ElementHandle(0);

fn profile(username: &str, id: &str) -> String {
    format!("https://stats.cc/siege/{}/{}", username, id)
}

/// A fake search page. Handle 0 is the search input, handle `n` is `links[n - 1]`.
#[derive(Default)]
struct ScriptedBackend {
    launch_error: Option<BackendError>,
    hang_on_launch: bool,
    panic_on_launch: bool,
    hang_on_close: bool,
    input_locator: Option<Locator>,
    /// Suggestion hrefs, visible once something was typed. `None` is unreadable.
    links: Vec<Option<String>>,
    enter_lands_on: Option<String>,
    click_lands_on: Option<String>,
    fail_navigation_to: Vec<String>,
    fail_input_click: bool,
    fail_scripted_click: bool,
    fail_find_all: bool,
    hang_on_navigate: bool,
    panic_on_find_all: bool,

    url: String,
    typed: String,
    calls: Vec<String>,
    launched: bool,
    closed: bool,
}

impl ScriptedBackend {
    fn with_input() -> Self {
        Self {
            input_locator: Some(ResolverConfig::default().locators[0].clone()),
            ..Default::default()
        }
    }

    fn links(mut self, links: &[&str]) -> Self {
        self.links = links.iter().map(|l| Some(l.to_string())).collect();
        self
    }

    fn called(&self, call: &str) -> bool {
        self.calls.iter().any(|c| c == call)
    }

    fn position(&self, call: &str) -> Option<usize> {
        self.calls.iter().position(|c| c == call)
    }

    fn link_href(&self, element: ElementHandle) -> Result<Option<String>, BackendError> {
        let index = element.0 as usize;
        if index == 0 || index > self.links.len() {
            return Err(BackendError::ElementNotFound(element));
        }
        self.links[index - 1]
            .clone()
            .map(Some)
            .ok_or(BackendError::ElementStale(element))
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        self.calls.push("launch".into());
        if self.panic_on_launch {
            panic!("browser crashed on startup");
        }
        if self.hang_on_launch {
            std::future::pending::<()>().await;
        }
        if let Some(e) = self.launch_error.clone() {
            return Err(e);
        }
        self.launched = true;
        self.url = "about:blank".into();
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.calls.push("close".into());
        if self.hang_on_close {
            std::future::pending::<()>().await;
        }
        self.closed = true;
        self.launched = false;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.launched
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        self.calls.push(format!("navigate {}", url));
        if self.hang_on_navigate {
            std::future::pending::<()>().await;
        }
        if self.fail_navigation_to.iter().any(|u| u == url) {
            return Err(BackendError::Navigation(format!("blocked: {}", url)));
        }
        self.url = url.to_string();
        Ok(NavigationResult {
            url: url.to_string(),
            title: String::new(),
            status: 200,
        })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        Ok(self.url.clone())
    }

    async fn query_element(
        &mut self,
        locator: &Locator,
    ) -> Result<Option<ElementHandle>, BackendError> {
        self.calls.push(format!("query {}", locator));
        let found = self.url == SEARCH_URL && self.input_locator.as_ref() == Some(locator);
        Ok(found.then_some(INPUT))
    }

    async fn find_all(&mut self, _locator: &Locator) -> Result<Vec<ElementHandle>, BackendError> {
        self.calls.push("find_all".into());
        if self.panic_on_find_all {
            panic!("driver crashed");
        }
        if self.fail_find_all {
            return Err(BackendError::Other("scan failed".into()));
        }
        if self.typed.is_empty() {
            return Ok(Vec::new());
        }
        Ok((1..=self.links.len() as u32).map(ElementHandle).collect())
    }

    async fn attribute(
        &mut self,
        element: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        assert_eq!(name, "href");
        self.link_href(element)
    }

    async fn clear(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        assert_eq!(element, INPUT);
        self.calls.push("clear".into());
        self.typed.clear();
        Ok(())
    }

    async fn click(&mut self, element: ElementHandle) -> Result<(), BackendError> {
        assert_eq!(element, INPUT);
        self.calls.push("click".into());
        if self.fail_input_click {
            return Err(BackendError::Other("element click intercepted".into()));
        }
        Ok(())
    }

    async fn send_keys(&mut self, element: ElementHandle, text: &str) -> Result<(), BackendError> {
        assert_eq!(element, INPUT);
        self.calls.push(format!("type {}", text));
        self.typed.push_str(text);
        Ok(())
    }

    async fn press_key(&mut self, element: ElementHandle, key: Key) -> Result<(), BackendError> {
        assert_eq!(element, INPUT);
        assert_eq!(key, Key::Enter);
        self.calls.push("enter".into());
        if let Some(url) = self.enter_lands_on.clone() {
            self.url = url;
        }
        Ok(())
    }

    async fn execute_script(
        &mut self,
        script: &str,
        element: Option<ElementHandle>,
    ) -> Result<serde_json::Value, BackendError> {
        let element = element.expect("scripts always target an element");
        self.calls.push(format!("script {} {}", element, script));
        if script.contains(".click()") {
            if self.fail_scripted_click {
                return Err(BackendError::ScriptError("click blocked".into()));
            }
            let landing = match self.click_lands_on.clone() {
                Some(url) => Some(url),
                None => self.link_href(element)?,
            };
            if let Some(url) = landing {
                self.url = url;
            }
        }
        Ok(serde_json::Value::Null)
    }
}

fn engine() -> ResolutionEngine {
    ResolutionEngine::new(ResolverConfig::default()).unwrap()
}

fn assert_resolved(result: &ResolutionResult, expected: &str) {
    assert!(result.success(), "expected success, got {:?}", result);
    assert_eq!(result.identifier(), Some(expected));
}

fn assert_failed(result: &ResolutionResult) {
    assert!(!result.success());
    assert_eq!(result.identifier(), None);
}

#[tokio::test(start_paused = true)]
async fn resolves_identifier_by_direct_navigation() {
    let alice = profile("alice", ID);
    let mut backend = ScriptedBackend::with_input().links(&[&alice]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert_eq!(backend.typed, "alice");
    assert!(backend.called(&format!("navigate {}", alice)));
    assert!(backend.closed);
}

#[tokio::test(start_paused = true)]
async fn username_match_beats_first_profile_link() {
    let bob = profile("bob", "aaaa-1111");
    let alice = profile("Alice", ID);
    let mut backend = ScriptedBackend::with_input().links(&[&bob, &alice]);

    let result = engine().resolve(&mut backend, "ALICE").await;

    assert_resolved(&result, ID);
    assert!(!backend.called(&format!("navigate {}", bob)));
}

#[tokio::test(start_paused = true)]
async fn falls_back_to_first_profile_link() {
    let bob = profile("bob", "aaaa-1111");
    let carol = profile("carol", "cccc-3333");
    let mut backend = ScriptedBackend::with_input().links(&[
        "https://stats.cc/siege/leaderboard",
        &bob,
        &carol,
    ]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, "aaaa-1111");
}

#[tokio::test(start_paused = true)]
async fn input_is_cleared_focused_then_typed() {
    let mut backend = ScriptedBackend::with_input().links(&[&profile("alice", ID)]);

    engine().resolve(&mut backend, "alice").await;

    let clear = backend.position("clear").unwrap();
    let click = backend.position("click").unwrap();
    let typed = backend.position("type alice").unwrap();
    assert!(clear < click && click < typed, "calls: {:?}", backend.calls);
}

#[tokio::test(start_paused = true)]
async fn intercepted_click_focuses_by_script() {
    let mut backend = ScriptedBackend::with_input().links(&[&profile("alice", ID)]);
    backend.fail_input_click = true;

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert!(backend.called("script #0 arguments[0].focus();"));
}

#[tokio::test(start_paused = true)]
async fn locators_are_tried_in_order() {
    let locators = ResolverConfig::default().locators;
    let mut backend = ScriptedBackend {
        input_locator: Some(locators[2].clone()),
        ..Default::default()
    }
    .links(&[&profile("alice", ID)]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    let first = backend.position(&format!("query {}", locators[0])).unwrap();
    let second = backend.position(&format!("query {}", locators[1])).unwrap();
    let third = backend.position(&format!("query {}", locators[2])).unwrap();
    assert!(first < second && second < third);
}

#[tokio::test(start_paused = true)]
async fn missing_search_input_fails_without_typing() {
    let mut backend = ScriptedBackend::default().links(&[&profile("alice", ID)]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.typed.is_empty());
    assert!(!backend.called("find_all"));
    assert!(backend.closed);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_still_closes_session() {
    let mut backend = ScriptedBackend {
        launch_error: Some(BackendError::LaunchFailed("no browser".into())),
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.closed);
    assert_eq!(backend.calls, vec!["launch", "close"]);
}

#[tokio::test(start_paused = true)]
async fn no_suggestions_submits_with_enter() {
    let mut backend = ScriptedBackend {
        enter_lands_on: Some(profile("alice", ID)),
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert!(backend.called("enter"));
}

#[tokio::test(start_paused = true)]
async fn enter_that_goes_nowhere_times_out_and_fails() {
    let mut backend = ScriptedBackend::with_input();

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.called("enter"));
    assert!(backend.closed);
}

#[tokio::test(start_paused = true)]
async fn scan_failure_submits_with_enter() {
    let mut backend = ScriptedBackend {
        fail_find_all: true,
        enter_lands_on: Some(profile("alice", ID)),
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
}

#[tokio::test(start_paused = true)]
async fn non_profile_links_get_a_scripted_click() {
    let mut backend = ScriptedBackend {
        click_lands_on: Some(profile("alice", ID)),
        ..ScriptedBackend::with_input()
    }
    .links(&["https://stats.cc/siege/leaderboard"]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert!(backend.called("script #1 arguments[0].click();"));
    assert!(!backend.called("enter"));
}

#[tokio::test(start_paused = true)]
async fn failed_direct_navigation_falls_back_to_scripted_click() {
    let alice = profile("alice", ID);
    let mut backend = ScriptedBackend {
        fail_navigation_to: vec![alice.clone()],
        ..ScriptedBackend::with_input()
    }
    .links(&[&alice]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert!(backend.called("script #1 arguments[0].click();"));
}

#[tokio::test(start_paused = true)]
async fn failed_scripted_click_falls_back_to_enter() {
    let mut backend = ScriptedBackend {
        fail_scripted_click: true,
        enter_lands_on: Some(profile("alice", ID)),
        ..ScriptedBackend::with_input()
    }
    .links(&["https://stats.cc/siege/leaderboard"]);

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert!(backend.called("enter"));
}

#[tokio::test(start_paused = true)]
async fn unreadable_links_are_skipped() {
    let mut backend = ScriptedBackend::with_input();
    backend.links = vec![None, Some(profile("alice", ID))];

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
}

#[tokio::test(start_paused = true)]
async fn non_profile_landing_page_fails_extraction() {
    let mut backend = ScriptedBackend {
        enter_lands_on: Some("https://stats.cc/siege/alice/overview".into()),
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
}

#[tokio::test(start_paused = true)]
async fn empty_username_is_attempted_not_rejected() {
    let mut backend = ScriptedBackend::with_input();

    let result = engine().resolve(&mut backend, "").await;

    assert_failed(&result);
    assert!(backend.called("clear"));
    assert!(backend.closed);
}

#[tokio::test(start_paused = true)]
async fn hung_backend_is_bounded_by_overall_deadline() {
    let mut backend = ScriptedBackend {
        hang_on_navigate: true,
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.closed);
}

#[tokio::test(start_paused = true)]
async fn panicking_backend_yields_failure() {
    let mut backend = ScriptedBackend {
        panic_on_find_all: true,
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.closed);
}

#[tokio::test(start_paused = true)]
async fn panicking_launch_yields_failure() {
    let mut backend = ScriptedBackend {
        panic_on_launch: true,
        ..ScriptedBackend::with_input()
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.closed);
    assert_eq!(backend.calls, vec!["launch", "close"]);
}

#[tokio::test(start_paused = true)]
async fn hung_launch_is_bounded_by_overall_deadline() {
    let mut backend = ScriptedBackend {
        hang_on_launch: true,
        ..ScriptedBackend::with_input()
    };
    let started = tokio::time::Instant::now();

    let result = engine().resolve(&mut backend, "alice").await;

    assert_failed(&result);
    assert!(backend.closed);
    assert_eq!(backend.calls, vec!["launch", "close"]);
    assert!(started.elapsed() >= ResolverConfig::default().overall_timeout().unwrap());
}

#[tokio::test(start_paused = true)]
async fn hung_close_does_not_hold_back_the_result() {
    let mut backend = ScriptedBackend {
        hang_on_close: true,
        ..ScriptedBackend::with_input().links(&[&profile("alice", ID)])
    };

    let result = engine().resolve(&mut backend, "alice").await;

    assert_resolved(&result, ID);
    assert_eq!(backend.calls.last().map(String::as_str), Some("close"));
    assert!(!backend.closed);
}

#[tokio::test(start_paused = true)]
async fn each_call_starts_a_fresh_session() {
    let mut backend = ScriptedBackend::with_input().links(&[&profile("alice", ID)]);
    let engine = ResolutionEngine::new(ResolverConfig {
        diagnostics: Diagnostics::Narrated,
        ..ResolverConfig::default()
    })
    .unwrap();

    let first = engine.resolve(&mut backend, "alice").await;
    backend.typed.clear();
    let second = engine.resolve(&mut backend, "alice").await;

    assert_eq!(first, second);
    assert_eq!(backend.calls.iter().filter(|c| *c == "launch").count(), 2);
    assert_eq!(backend.calls.iter().filter(|c| *c == "close").count(), 2);
}
