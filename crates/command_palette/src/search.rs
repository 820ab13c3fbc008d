//! Debounced, race-safe search across domain-scoped providers.
//!
//! Every dispatch takes the next [`DispatchId`]. A response is applied only while its dispatch is
//! still the latest one, so a slow early response can never replace the results of a faster later
//! query. Nothing is aborted; superseded work simply settles into the void.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    future::Future,
    rc::{Rc, Weak},
    time::Duration,
};

use futures::future::{join_all, LocalBoxFuture};
use leptos::{
    create_rw_signal, logging, ReadSignal, RwSignal, SignalGetUntracked, SignalSet, SignalUpdate,
};
use palette_contract::{PaletteError, ProviderToken, SearchDomain};
use palette_host::{DelayService, NotificationService, PaletteHostServices};

use crate::{
    config::{PaletteConfig, SearchPolicy},
    handle::ProviderRegistration,
    model::SearchResult,
    runtime::Spawner,
};

/// Async lookup for one domain; receives the trimmed query.
pub type SearchProvider =
    Rc<dyn Fn(String) -> LocalBoxFuture<'static, Result<Vec<SearchResult>, PaletteError>>>;

/// Sequence number of one search dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DispatchId(pub u64);

/// Progress of the current query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStatus {
    /// No query.
    #[default]
    Idle,
    /// Waiting for typing to pause.
    Debouncing,
    /// Query shorter than every domain's minimum.
    NeedsMoreInput {
        /// Smallest minimum length among the requested domains.
        min_len: usize,
    },
    /// A dispatch is in flight.
    Loading,
    /// Results for the latest dispatch are applied.
    Ready,
}

/// Results contributed by one domain.
#[derive(Debug, Clone)]
pub struct DomainResults {
    /// Source domain.
    pub domain: SearchDomain,
    /// Results in provider order, truncated to the domain policy.
    pub results: Vec<SearchResult>,
}

/// Reactive view of the search state.
#[derive(Debug, Clone, Default)]
pub struct SearchSnapshot {
    /// Raw input text.
    pub query: String,
    /// Progress of the current query.
    pub status: SearchStatus,
    /// Latest dispatch.
    pub dispatched: Option<DispatchId>,
    /// Trimmed query of the latest dispatch.
    pub dispatched_query: Option<String>,
    /// Results in requested domain order.
    pub results: Vec<DomainResults>,
    /// Domains whose provider failed for the applied dispatch.
    pub failed_domains: Vec<SearchDomain>,
}

impl SearchSnapshot {
    /// Whether the current dispatch has not settled.
    pub fn is_searching(&self) -> bool {
        self.status == SearchStatus::Loading
    }

    /// All results across domains.
    pub fn all_results(&self) -> impl Iterator<Item = &SearchResult> {
        self.results.iter().flat_map(|domain| domain.results.iter())
    }

    /// Results for one domain.
    pub fn results_for(&self, domain: &SearchDomain) -> &[SearchResult] {
        self.results
            .iter()
            .find(|entry| &entry.domain == domain)
            .map(|entry| entry.results.as_slice())
            .unwrap_or_default()
    }
}

struct RegisteredSearch {
    token: ProviderToken,
    provider: SearchProvider,
}

#[derive(Default)]
struct OrchestratorState {
    next_token: u64,
    providers: BTreeMap<SearchDomain, RegisteredSearch>,
    policies: BTreeMap<SearchDomain, SearchPolicy>,
    input_generation: u64,
    dispatch_seq: u64,
}

/// Debounced search orchestrator.
#[derive(Clone)]
pub struct SearchOrchestrator {
    state: Rc<RefCell<OrchestratorState>>,
    snapshot: RwSignal<SearchSnapshot>,
    debounce: Duration,
    default_policy: SearchPolicy,
    error_fallback: Rc<str>,
    delays: Rc<dyn DelayService>,
    notifications: Rc<dyn NotificationService>,
    spawner: Spawner,
}

impl SearchOrchestrator {
    /// Creates an orchestrator with the configured debounce and domain policies.
    pub fn new(config: &PaletteConfig, host: &PaletteHostServices, spawner: Spawner) -> Self {
        let policies = config
            .search_domains
            .iter()
            .map(|(domain, policy)| (SearchDomain::new(domain.clone()), *policy))
            .collect();
        Self {
            state: Rc::new(RefCell::new(OrchestratorState {
                policies,
                ..OrchestratorState::default()
            })),
            snapshot: create_rw_signal(SearchSnapshot::default()),
            debounce: config.debounce(),
            default_policy: SearchPolicy::default(),
            error_fallback: Rc::from(config.error_fallback.as_str()),
            delays: host.delays.clone(),
            notifications: host.notifications.clone(),
            spawner,
        }
    }

    /// Registers the provider for `domain`, replacing any earlier one.
    ///
    /// Unregistering a replaced provider's handle leaves the replacement in place.
    pub fn register_search_provider<F, Fut>(
        &self,
        domain: SearchDomain,
        provider: F,
    ) -> ProviderRegistration
    where
        F: Fn(String) -> Fut + 'static,
        Fut: Future<Output = Result<Vec<SearchResult>, PaletteError>> + 'static,
    {
        let provider: SearchProvider = Rc::new(move |query| Box::pin(provider(query)));
        let token = {
            let mut state = self.state.borrow_mut();
            state.next_token = state.next_token.saturating_add(1);
            let token = ProviderToken(state.next_token);
            if state
                .providers
                .insert(domain.clone(), RegisteredSearch { token, provider })
                .is_some()
            {
                logging::warn!("command palette: search provider for `{domain}` replaced");
            }
            token
        };

        let weak = Rc::downgrade(&self.state);
        ProviderRegistration::new(token, move || remove_search_provider(&weak, &domain, token))
    }

    /// Overrides the policy of one domain.
    pub fn set_policy(&self, domain: SearchDomain, policy: SearchPolicy) {
        self.state.borrow_mut().policies.insert(domain, policy);
    }

    /// Policy applied to `domain`.
    pub fn policy(&self, domain: &SearchDomain) -> SearchPolicy {
        self.state
            .borrow()
            .policies
            .get(domain)
            .copied()
            .unwrap_or(self.default_policy)
    }

    /// Whether a provider is registered for `domain`.
    pub fn has_provider(&self, domain: &SearchDomain) -> bool {
        self.state.borrow().providers.contains_key(domain)
    }

    /// Reactive snapshot.
    pub fn snapshot(&self) -> ReadSignal<SearchSnapshot> {
        self.snapshot.read_only()
    }

    /// Current snapshot without tracking.
    pub fn snapshot_untracked(&self) -> SearchSnapshot {
        self.snapshot.get_untracked()
    }

    /// Records new input and restarts the debounce for `domains`.
    pub fn input(&self, domains: &[SearchDomain], raw: &str) {
        let query = raw.trim().to_string();
        let generation = self.next_generation();

        if query.is_empty() {
            self.invalidate_dispatch();
            self.snapshot.set(SearchSnapshot {
                query: raw.to_string(),
                ..SearchSnapshot::default()
            });
            return;
        }

        let query_len = query.chars().count();
        let eligible = domains
            .iter()
            .filter(|domain| query_len >= self.policy(domain).min_query_len)
            .cloned()
            .collect::<Vec<_>>();

        if eligible.is_empty() {
            let min_len = domains
                .iter()
                .map(|domain| self.policy(domain).min_query_len)
                .min()
                .unwrap_or_default();
            self.invalidate_dispatch();
            self.snapshot.set(SearchSnapshot {
                query: raw.to_string(),
                status: SearchStatus::NeedsMoreInput { min_len },
                ..SearchSnapshot::default()
            });
            return;
        }

        self.snapshot.update(|snapshot| {
            snapshot.query = raw.to_string();
            snapshot.status = SearchStatus::Debouncing;
        });

        let this = self.clone();
        let wait = self.delays.delay(self.debounce);
        (self.spawner)(Box::pin(async move {
            wait.await;
            if this.state.borrow().input_generation != generation {
                return;
            }
            this.dispatch(eligible, query).await;
        }));
    }

    /// Drops pending input and in-flight results and clears the snapshot.
    pub fn reset(&self) {
        self.next_generation();
        self.invalidate_dispatch();
        self.snapshot.set(SearchSnapshot::default());
    }

    fn next_generation(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        state.input_generation = state.input_generation.saturating_add(1);
        state.input_generation
    }

    fn invalidate_dispatch(&self) -> DispatchId {
        let mut state = self.state.borrow_mut();
        state.dispatch_seq = state.dispatch_seq.saturating_add(1);
        DispatchId(state.dispatch_seq)
    }

    fn is_latest(&self, dispatch: DispatchId) -> bool {
        self.state.borrow().dispatch_seq == dispatch.0
    }

    async fn dispatch(&self, domains: Vec<SearchDomain>, query: String) {
        let dispatch = self.invalidate_dispatch();
        let lookups = {
            let state = self.state.borrow();
            domains
                .into_iter()
                .map(|domain| {
                    let provider = state
                        .providers
                        .get(&domain)
                        .map(|registered| registered.provider.clone());
                    (domain, provider)
                })
                .collect::<Vec<_>>()
        };

        self.snapshot.update(|snapshot| {
            snapshot.status = SearchStatus::Loading;
            snapshot.dispatched = Some(dispatch);
            snapshot.dispatched_query = Some(query.clone());
        });

        let pending = lookups.into_iter().map(|(domain, provider)| {
            let query = query.clone();
            async move {
                let outcome = match provider {
                    Some(provider) => provider(query).await,
                    None => {
                        logging::log!("command palette: no search provider for `{domain}`");
                        Ok(Vec::new())
                    }
                };
                (domain, outcome)
            }
        });
        let outcomes = join_all(pending).await;

        if !self.is_latest(dispatch) {
            logging::log!(
                "command palette: discarding stale search {} for `{query}`",
                dispatch.0
            );
            return;
        }

        let mut results = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for (domain, outcome) in outcomes {
            match outcome {
                Ok(mut found) => {
                    found.truncate(self.policy(&domain).max_results);
                    results.push(DomainResults {
                        domain,
                        results: found,
                    });
                }
                Err(err) => {
                    logging::warn!("command palette: `{domain}` search failed: {err}");
                    results.push(DomainResults {
                        domain: domain.clone(),
                        results: Vec::new(),
                    });
                    failures.push((domain, err));
                }
            }
        }

        let failed_domains = failures.iter().map(|(domain, _)| domain.clone()).collect();
        self.snapshot.update(|snapshot| {
            // Input typed since this dispatch is still debouncing.
            if snapshot.query.trim() == query {
                snapshot.status = SearchStatus::Ready;
            }
            snapshot.results = results;
            snapshot.failed_domains = failed_domains;
        });

        for (domain, err) in failures {
            self.notifications.error(&format!(
                "{} search failed: {}",
                domain_label(&domain),
                err.message_or(&self.error_fallback)
            ));
        }
    }
}

fn domain_label(domain: &SearchDomain) -> String {
    match domain.as_str() {
        SearchDomain::USER => "User".to_string(),
        SearchDomain::FEATURE_FLAG => "Feature flag".to_string(),
        other => other.replace('_', " "),
    }
}

fn remove_search_provider(
    state: &Weak<RefCell<OrchestratorState>>,
    domain: &SearchDomain,
    token: ProviderToken,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.borrow_mut();
    if state
        .providers
        .get(domain)
        .is_some_and(|registered| registered.token == token)
    {
        state.providers.remove(domain);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use palette_contract::SearchResultDescriptor;
    use palette_host::NotificationLevel;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{model::action, runtime::testing::Harness};

    fn result(domain: SearchDomain, id: &str) -> SearchResult {
        SearchResult::new(
            SearchResultDescriptor::new(id, id, domain),
            action(|_| async { Ok(()) }),
        )
    }

    fn titles(snapshot: &SearchSnapshot) -> Vec<String> {
        snapshot
            .all_results()
            .map(|result| result.descriptor.title.clone())
            .collect()
    }

    fn orchestrator(harness: &Harness) -> SearchOrchestrator {
        SearchOrchestrator::new(&PaletteConfig::default(), &harness.host(), harness.spawner())
    }

    #[test]
    fn typing_restarts_the_debounce() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        let _user = search.register_search_provider(SearchDomain::user(), move |query: String| {
            seen.borrow_mut().push(query.clone());
            async move { Ok(vec![result(SearchDomain::user(), &query)]) }
        });
        let domains = [SearchDomain::user()];

        search.input(&domains, "al");
        harness.advance(200);
        search.input(&domains, "ali");
        harness.advance(200);
        search.input(&domains, "alic");
        harness.advance(299);
        assert!(calls.borrow().is_empty());
        assert_eq!(search.snapshot_untracked().status, SearchStatus::Debouncing);

        harness.advance(1);
        assert_eq!(*calls.borrow(), vec!["alic".to_string()]);
        let snapshot = search.snapshot_untracked();
        assert_eq!(snapshot.status, SearchStatus::Ready);
        assert_eq!(titles(&snapshot), vec!["alic"]);
    }

    #[test]
    fn slow_early_response_never_overwrites_later_one() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let clock = harness.clock.clone();
        let _user = search.register_search_provider(SearchDomain::user(), move |query: String| {
            let wait = clock.delay(Duration::from_millis(if query == "al" { 500 } else { 50 }));
            async move {
                wait.await;
                Ok(vec![result(SearchDomain::user(), &query)])
            }
        });
        let domains = [SearchDomain::user()];

        search.input(&domains, "al");
        harness.advance(300);
        assert!(search.snapshot_untracked().is_searching());
        assert_eq!(
            search.snapshot_untracked().dispatched_query.as_deref(),
            Some("al")
        );

        search.input(&domains, "ali");
        harness.advance(300);
        harness.advance(50);
        let applied = search.snapshot_untracked();
        assert_eq!(titles(&applied), vec!["ali"]);
        assert!(!applied.is_searching());

        harness.advance(200);
        let after_stale = search.snapshot_untracked();
        assert_eq!(titles(&after_stale), vec!["ali"]);
        assert_eq!(after_stale.dispatched, applied.dispatched);
    }

    #[test]
    fn response_during_a_newer_debounce_keeps_debouncing() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let clock = harness.clock.clone();
        let _user = search.register_search_provider(SearchDomain::user(), move |query: String| {
            let wait = clock.delay(Duration::from_millis(200));
            async move {
                wait.await;
                Ok(vec![result(SearchDomain::user(), &query)])
            }
        });
        let domains = [SearchDomain::user()];

        search.input(&domains, "al");
        harness.advance(300);
        harness.advance(100);
        search.input(&domains, "ali");
        harness.advance(100);
        let snapshot = search.snapshot_untracked();
        assert_eq!(snapshot.status, SearchStatus::Debouncing);
        assert_eq!(titles(&snapshot), vec!["al"]);

        harness.advance(200);
        assert_eq!(search.snapshot_untracked().status, SearchStatus::Loading);

        harness.advance(200);
        let snapshot = search.snapshot_untracked();
        assert_eq!(snapshot.status, SearchStatus::Ready);
        assert_eq!(titles(&snapshot), vec!["ali"]);
    }

    #[test]
    fn short_queries_ask_for_more_input() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _user = search.register_search_provider(SearchDomain::user(), move |_query: String| {
            counter.set(counter.get() + 1);
            async { Ok(Vec::new()) }
        });

        search.input(&[SearchDomain::user()], " a ");
        harness.advance(1_000);

        assert_eq!(calls.get(), 0);
        assert_eq!(
            search.snapshot_untracked().status,
            SearchStatus::NeedsMoreInput { min_len: 2 }
        );
    }

    #[test]
    fn shrinking_below_minimum_invalidates_in_flight_dispatch() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let clock = harness.clock.clone();
        let _user = search.register_search_provider(SearchDomain::user(), move |query: String| {
            let wait = clock.delay(Duration::from_millis(100));
            async move {
                wait.await;
                Ok(vec![result(SearchDomain::user(), &query)])
            }
        });
        let domains = [SearchDomain::user()];

        search.input(&domains, "al");
        harness.advance(300);
        search.input(&domains, "a");
        harness.advance(100);

        let snapshot = search.snapshot_untracked();
        assert!(titles(&snapshot).is_empty());
        assert_eq!(snapshot.status, SearchStatus::NeedsMoreInput { min_len: 2 });
    }

    #[test]
    fn rejected_domain_yields_empty_results_and_a_notification() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let _flags = search.register_search_provider(SearchDomain::feature_flag(), |_q: String| async {
            Err(PaletteError::provider("503 Service Unavailable"))
        });
        let _users = search.register_search_provider(SearchDomain::user(), |query: String| async move {
            Ok(vec![result(SearchDomain::user(), &format!("user:{query}"))])
        });

        search.input(&[SearchDomain::feature_flag(), SearchDomain::user()], "xy");
        harness.advance(300);

        let snapshot = search.snapshot_untracked();
        assert_eq!(snapshot.status, SearchStatus::Ready);
        assert!(snapshot.results_for(&SearchDomain::feature_flag()).is_empty());
        assert_eq!(titles(&snapshot), vec!["user:xy"]);
        assert_eq!(snapshot.failed_domains, vec![SearchDomain::feature_flag()]);
        assert_eq!(
            harness.notifications.messages(NotificationLevel::Error),
            vec!["Feature flag search failed: 503 Service Unavailable".to_string()]
        );
    }

    #[test]
    fn single_failing_domain_settles_to_empty() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let _flags = search.register_search_provider(SearchDomain::feature_flag(), |_q: String| async {
            Err(PaletteError::provider(""))
        });

        search.input(&[SearchDomain::feature_flag()], "x");
        harness.advance(300);

        let snapshot = search.snapshot_untracked();
        assert!(!snapshot.is_searching());
        assert_eq!(snapshot.all_results().count(), 0);
        assert_eq!(
            harness.notifications.messages(NotificationLevel::Error),
            vec!["Feature flag search failed: Something went wrong".to_string()]
        );
    }

    #[test]
    fn results_are_truncated_to_policy() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        search.set_policy(
            SearchDomain::user(),
            SearchPolicy {
                min_query_len: 1,
                max_results: 2,
            },
        );
        let _user = search.register_search_provider(SearchDomain::user(), |_q: String| async {
            Ok((0..5)
                .map(|i| result(SearchDomain::user(), &format!("u{i}")))
                .collect())
        });

        search.input(&[SearchDomain::user()], "u");
        harness.advance(300);
        assert_eq!(titles(&search.snapshot_untracked()), vec!["u0", "u1"]);
    }

    #[test]
    fn reset_discards_pending_and_in_flight_work() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let clock = harness.clock.clone();
        let _user = search.register_search_provider(SearchDomain::user(), move |query: String| {
            let wait = clock.delay(Duration::from_millis(100));
            async move {
                wait.await;
                Ok(vec![result(SearchDomain::user(), &query)])
            }
        });

        search.input(&[SearchDomain::user()], "alice");
        harness.advance(300);
        search.reset();
        harness.advance(100);

        let snapshot = search.snapshot_untracked();
        assert_eq!(snapshot.status, SearchStatus::Idle);
        assert!(snapshot.query.is_empty());
        assert_eq!(snapshot.all_results().count(), 0);
    }

    #[test]
    fn replaced_provider_survives_old_handle_release() {
        let mut harness = Harness::new();
        let search = orchestrator(&harness);
        let old = search.register_search_provider(SearchDomain::user(), |_q: String| async {
            Ok(vec![result(SearchDomain::user(), "old")])
        });
        let _new = search.register_search_provider(SearchDomain::user(), |_q: String| async {
            Ok(vec![result(SearchDomain::user(), "new")])
        });
        old.unregister();
        assert!(search.has_provider(&SearchDomain::user()));

        search.input(&[SearchDomain::user()], "al");
        harness.advance(300);
        assert_eq!(titles(&search.snapshot_untracked()), vec!["new"]);
    }
}
