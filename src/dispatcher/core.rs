use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::RouterError;
use crate::handlers::Handler;
use crate::params::Params;
use crate::router::{Rule, RuleTable};
use crate::runtime_config::RouterConfig;

/// Which variant a [`DispatchResult`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchStatus {
    Found,
    MethodNotAllowed,
    NotFound,
}

impl DispatchStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Found => "Found",
            DispatchStatus::MethodNotAllowed => "MethodNotAllowed",
            DispatchStatus::NotFound => "NotFound",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one (method, path) pair.
///
/// Unmatched requests are ordinary variants here, not errors. The accessors
/// return [`RouterError::StateMismatch`] when called on the wrong variant.
#[derive(Debug, Clone)]
pub enum DispatchResult {
    /// A rule for this method matched; `params` holds the decoded captures
    Found { rule: Arc<Rule>, params: Params },
    /// The path matched, but only under other methods
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

impl DispatchResult {
    #[must_use]
    pub fn status(&self) -> DispatchStatus {
        match self {
            DispatchResult::Found { .. } => DispatchStatus::Found,
            DispatchResult::MethodNotAllowed { .. } => DispatchStatus::MethodNotAllowed,
            DispatchResult::NotFound => DispatchStatus::NotFound,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, DispatchResult::Found { .. })
    }

    fn mismatch(&self, expected: DispatchStatus) -> RouterError {
        RouterError::StateMismatch {
            expected: expected.as_str(),
            actual: self.status().as_str(),
        }
    }

    /// The matched rule.
    ///
    /// # Errors
    ///
    /// [`RouterError::StateMismatch`] unless the result is `Found`.
    pub fn rule(&self) -> Result<&Arc<Rule>, RouterError> {
        match self {
            DispatchResult::Found { rule, .. } => Ok(rule),
            _ => Err(self.mismatch(DispatchStatus::Found)),
        }
    }

    /// The matched rule's handler.
    ///
    /// # Errors
    ///
    /// [`RouterError::StateMismatch`] unless the result is `Found`.
    pub fn handler(&self) -> Result<&Arc<dyn Handler>, RouterError> {
        self.rule().map(|rule| rule.handler())
    }

    /// Path parameters captured by the match.
    ///
    /// # Errors
    ///
    /// [`RouterError::StateMismatch`] unless the result is `Found`.
    pub fn params(&self) -> Result<&Params, RouterError> {
        match self {
            DispatchResult::Found { params, .. } => Ok(params),
            _ => Err(self.mismatch(DispatchStatus::Found)),
        }
    }

    /// Methods registered for the path, deduplicated, in registration order.
    ///
    /// # Errors
    ///
    /// [`RouterError::StateMismatch`] unless the result is `MethodNotAllowed`.
    pub fn allowed_methods(&self) -> Result<&[Method], RouterError> {
        match self {
            DispatchResult::MethodNotAllowed { allowed } => Ok(allowed),
            _ => Err(self.mismatch(DispatchStatus::MethodNotAllowed)),
        }
    }
}

/// Read-only matcher over a frozen rule table.
///
/// Rules are bucketed by the segment counts of their pattern alternatives, so
/// a request only tests rules that could match its path length. Within a
/// bucket rules keep registration order, which makes the result identical to a
/// linear scan of the whole table.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    table: RuleTable,
    by_segment_count: HashMap<usize, Vec<usize>>,
    head_falls_back_to_get: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new(table: RuleTable, config: &RouterConfig) -> Self {
        let mut by_segment_count: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, rule) in table.iter().enumerate() {
            for count in rule.pattern().segment_counts() {
                let bucket = by_segment_count.entry(count).or_default();
                if bucket.last() != Some(&i) {
                    bucket.push(i);
                }
            }
        }
        debug!(
            rules = table.len(),
            buckets = by_segment_count.len(),
            "Dispatcher index built"
        );
        Self {
            table,
            by_segment_count,
            head_falls_back_to_get: config.head_falls_back_to_get,
        }
    }

    #[must_use]
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Resolve `method` and `path` against the table.
    ///
    /// The path is percent-decoded, then split on `/`; a trailing slash is a
    /// significant empty segment. The method is compared as given, so
    /// lowercase tokens never match a rule. Nothing here fails: a path that
    /// does not decode, or a method that is not a valid HTTP token, is
    /// `NotFound`.
    #[must_use]
    pub fn dispatch(&self, method: &str, path: &str) -> DispatchResult {
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = Instant::now();

        if Method::from_bytes(method.as_bytes()).is_err() {
            warn!(method = ?method, path = %path, "Malformed request method");
            return DispatchResult::NotFound;
        }
        let Ok(decoded) = urlencoding::decode(path) else {
            warn!(method = %method, path = %path, "Path is not valid percent-encoded UTF-8");
            return DispatchResult::NotFound;
        };
        let segments: Vec<&str> = decoded.split('/').collect();

        let mut allowed: Vec<Method> = Vec::new();
        let mut get_match: Option<(Arc<Rule>, Params)> = None;

        for &i in self.by_segment_count.get(&segments.len()).into_iter().flatten() {
            let Some(rule) = self.table.at(i) else {
                continue;
            };
            let Some(params) = rule.pattern().match_segments(&segments) else {
                continue;
            };
            if rule.method().as_str() == method {
                log_matched(method, path, rule, &params, match_start.elapsed());
                return DispatchResult::Found {
                    rule: Arc::clone(rule),
                    params,
                };
            }
            if self.head_falls_back_to_get
                && method == Method::HEAD.as_str()
                && *rule.method() == Method::GET
                && get_match.is_none()
            {
                get_match = Some((Arc::clone(rule), params));
            }
            if !allowed.contains(rule.method()) {
                allowed.push(rule.method().clone());
            }
        }

        if let Some((rule, params)) = get_match {
            log_matched(method, path, &rule, &params, match_start.elapsed());
            return DispatchResult::Found { rule, params };
        }

        let duration = match_start.elapsed();
        if allowed.is_empty() {
            warn!(
                method = %method,
                path = %path,
                duration_us = duration.as_micros(),
                "No route matched"
            );
            DispatchResult::NotFound
        } else {
            warn!(
                method = %method,
                path = %path,
                allowed = ?allowed,
                duration_us = duration.as_micros(),
                "Method not allowed"
            );
            DispatchResult::MethodNotAllowed { allowed }
        }
    }
}

fn log_matched(method: &str, path: &str, rule: &Rule, params: &Params, duration: Duration) {
    if duration > Duration::from_millis(1) {
        warn!(
            method = %method,
            path = %path,
            handler_name = %rule.handler_name(),
            route_pattern = %rule.pattern().source(),
            path_params = ?params,
            duration_us = duration.as_micros(),
            "Slow route matching detected"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            handler_name = %rule.handler_name(),
            route_pattern = %rule.pattern().source(),
            path_params = ?params,
            duration_us = duration.as_micros(),
            "Route matched"
        );
    }
}
