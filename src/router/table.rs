use http::Method;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::error::RouterError;
use crate::handlers::Handler;
use crate::pattern::RoutePattern;
use crate::runtime_config::DuplicatePolicy;

/// One registered binding of (method, pattern) to a handler.
///
/// Rules registered together by one `map` call share their compiled pattern.
pub struct Rule {
    method: Method,
    pattern: Arc<RoutePattern>,
    handler: Arc<dyn Handler>,
    handler_name: String,
}

impl Rule {
    pub(crate) fn new(
        method: Method,
        pattern: Arc<RoutePattern>,
        handler: Arc<dyn Handler>,
        handler_name: impl Into<String>,
    ) -> Self {
        Self {
            method,
            pattern,
            handler,
            handler_name: handler_name.into(),
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Registry key or type name the handler was registered under.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("method", &self.method)
            .field("pattern", &self.pattern.source())
            .field("handler", &self.handler_name)
            .finish()
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.method,
            self.pattern.source(),
            self.handler_name
        )
    }
}

/// Insertion-ordered rules keyed by (method, pattern source).
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Arc<Rule>>,
    index: HashMap<(Method, String), usize>,
}

impl RuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Rule>> {
        self.rules.iter()
    }

    /// Rule at a registration position.
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Arc<Rule>> {
        self.rules.get(position)
    }

    #[must_use]
    pub fn get(&self, method: &Method, pattern: &str) -> Option<&Arc<Rule>> {
        self.index
            .get(&(method.clone(), pattern.to_string()))
            .map(|&i| &self.rules[i])
    }

    #[must_use]
    pub fn contains(&self, method: &Method, pattern: &str) -> bool {
        self.get(method, pattern).is_some()
    }

    /// Methods bound to exactly this pattern source, in registration order.
    #[must_use]
    pub fn methods_for(&self, pattern: &str) -> Vec<Method> {
        self.rules
            .iter()
            .filter(|r| r.pattern.source() == pattern)
            .map(|r| r.method.clone())
            .collect()
    }

    /// Add a rule, honouring `policy` when its identity key is taken.
    ///
    /// Under [`DuplicatePolicy::Overwrite`] the existing rule keeps its
    /// position; only its handler changes.
    pub(crate) fn insert(&mut self, rule: Rule, policy: DuplicatePolicy) -> Result<(), RouterError> {
        let key = (rule.method.clone(), rule.pattern.source().to_string());
        match (self.index.get(&key), policy) {
            (Some(_), DuplicatePolicy::Reject) => Err(RouterError::DuplicateRoute {
                method: key.0.to_string(),
                pattern: key.1,
            }),
            (Some(&i), DuplicatePolicy::Overwrite) => {
                warn!(
                    method = %rule.method,
                    pattern = %rule.pattern.source(),
                    previous_handler = %self.rules[i].handler_name,
                    handler = %rule.handler_name,
                    "Duplicate route replaced existing handler"
                );
                self.rules[i] = Arc::new(rule);
                Ok(())
            }
            (None, _) => {
                self.index.insert(key, self.rules.len());
                self.rules.push(Arc::new(rule));
                Ok(())
            }
        }
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a Arc<Rule>;
    type IntoIter = std::slice::Iter<'a, Arc<Rule>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
