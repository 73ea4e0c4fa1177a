//! A module for defining the [`Workload`] a simulated user runs against the shortener.

use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;

/// Fixed prefix of every generated long URL.
pub const LONG_URL_PREFIX: &str = "https://example.com/";

/// Number of random characters appended to [`LONG_URL_PREFIX`].
pub const LONG_URL_SUFFIX_LEN: usize = 16;

/// Generates a pseudo-random long URL.
///
/// The path is drawn uniformly from `[A-Za-z0-9]`, which keeps repeated long URLs (and therefore
/// cache and deduplication hits in the service) rare.
pub fn random_long_url() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(LONG_URL_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{LONG_URL_PREFIX}{suffix}")
}

/// An action a simulated user can perform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Action {
    /// Create a short URL for a random long URL.
    CreateShortUrl,
    /// Resolve a previously created short URL.
    ResolveShortUrl,
    /// Hit the health endpoint.
    HealthCheck,
}

impl Action {
    /// All actions, in registration order.
    pub const ALL: [Action; 3] = [
        Action::CreateShortUrl,
        Action::ResolveShortUrl,
        Action::HealthCheck,
    ];

    /// The default relative selection weight of this action.
    pub fn default_weight(self) -> usize {
        match self {
            Action::CreateShortUrl => 5,
            Action::ResolveShortUrl => 10,
            Action::HealthCheck => 1,
        }
    }

    /// Name of the transaction in reports.
    pub fn name(self) -> &'static str {
        match self {
            Action::CreateShortUrl => "create_short_url",
            Action::ResolveShortUrl => "resolve_short_url",
            Action::HealthCheck => "health_check",
        }
    }
}

/// A builder for creating a [`Workload`].
#[derive(Debug)]
pub struct WorkloadBuilder {
    name: String,

    min_wait: Duration,
    max_wait: Duration,

    create_weight: usize,
    resolve_weight: usize,
    health_check_weight: usize,
}

impl WorkloadBuilder {
    /// Bounds of the uniformly random think time between two actions of the same user.
    pub fn wait_time(mut self, min: Duration, max: Duration) -> Self {
        self.min_wait = min;
        self.max_wait = max;
        self
    }

    /// The ratio between creates, resolves and health checks.
    ///
    /// An action with weight `0` is never scheduled.
    pub fn action_weights(mut self, creates: usize, resolves: usize, health_checks: usize) -> Self {
        self.create_weight = creates;
        self.resolve_weight = resolves;
        self.health_check_weight = health_checks;
        self
    }

    /// Creates the workload instance.
    pub fn build(self) -> Workload {
        Workload {
            name: self.name,
            min_wait: self.min_wait,
            max_wait: self.max_wait,
            weights: [
                (Action::CreateShortUrl, self.create_weight),
                (Action::ResolveShortUrl, self.resolve_weight),
                (Action::HealthCheck, self.health_check_weight),
            ],
        }
    }
}

/// Description of the behavior of one kind of simulated user.
#[derive(Clone, Debug)]
pub struct Workload {
    /// Name of the workload, used as the scenario name in reports.
    pub(crate) name: String,
    /// Lower bound of the think time between actions.
    pub(crate) min_wait: Duration,
    /// Upper bound of the think time between actions.
    pub(crate) max_wait: Duration,
    /// Relative selection weight of every action.
    weights: [(Action, usize); 3],
}

impl Workload {
    /// Constructs a new workload builder with the given name.
    pub fn builder(name: impl Into<String>) -> WorkloadBuilder {
        WorkloadBuilder {
            name: name.into(),

            min_wait: Duration::from_millis(100),
            max_wait: Duration::from_millis(500),

            create_weight: Action::CreateShortUrl.default_weight(),
            resolve_weight: Action::ResolveShortUrl.default_weight(),
            health_check_weight: Action::HealthCheck.default_weight(),
        }
    }

    /// The name of this workload.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured weight of `action`.
    pub fn weight(&self, action: Action) -> usize {
        self.weights
            .iter()
            .find(|(a, _)| *a == action)
            .map_or(0, |(_, weight)| *weight)
    }

    /// Actions that take part in weighted selection, together with their weight.
    pub fn weighted_actions(&self) -> impl Iterator<Item = (Action, usize)> + '_ {
        self.weights.iter().copied().filter(|(_, weight)| *weight > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_url_suffix_is_alphanumeric() {
        for _ in 0..1000 {
            let url = random_long_url();
            let suffix = url.strip_prefix(LONG_URL_PREFIX).unwrap();

            assert_eq!(suffix.len(), LONG_URL_SUFFIX_LEN);
            assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()), "{url}");
        }
    }

    #[test]
    fn long_urls_do_not_repeat() {
        let a = random_long_url();
        let b = random_long_url();
        assert_ne!(a, b);
    }

    #[test]
    fn default_weights() {
        let workload = Workload::builder("test").build();

        assert_eq!(workload.weight(Action::ResolveShortUrl), 10);
        assert_eq!(workload.weight(Action::CreateShortUrl), 5);
        assert_eq!(workload.weight(Action::HealthCheck), 1);
        assert_eq!(workload.min_wait, Duration::from_millis(100));
        assert_eq!(workload.max_wait, Duration::from_millis(500));
    }

    #[test]
    fn zero_weight_actions_are_skipped() {
        let workload = Workload::builder("test").action_weights(3, 0, 1).build();

        let actions: Vec<_> = workload.weighted_actions().collect();
        assert_eq!(
            actions,
            [(Action::CreateShortUrl, 3), (Action::HealthCheck, 1)]
        );
    }
}
