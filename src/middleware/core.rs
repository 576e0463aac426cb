use std::sync::Arc;

use crate::error::RouterError;
use crate::message::{Request, Response};

/// One stage of the onion.
///
/// A stage receives the request and the continuation bound to the rest of the
/// queue. It may return without calling `next` (short-circuit), call it once
/// and pass the response through, or adjust the response on the way out.
pub trait Middleware: Send + Sync {
    /// # Errors
    ///
    /// An error aborts the pipeline; it propagates to the caller unchanged.
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response>;
}

impl<F> Middleware for F
where
    F: Fn(&mut Request, Next<'_>) -> anyhow::Result<Response> + Send + Sync,
{
    fn handle(&self, req: &mut Request, next: Next<'_>) -> anyhow::Result<Response> {
        self(req, next)
    }
}

/// Pin a closure to the [`Middleware`] signature.
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&mut Request, Next<'_>) -> anyhow::Result<Response> + Send + Sync + 'static,
{
    f
}

/// Continuation over the stages after the current one.
///
/// Consumed by [`Next::run`], so a stage can invoke the remainder at most once.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    /// Run the remainder of the queue.
    ///
    /// # Errors
    ///
    /// [`RouterError::PipelineExhausted`] if there is nothing left to run,
    /// otherwise whatever the next stage returns.
    pub fn run(self, req: &mut Request) -> anyhow::Result<Response> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(req, Next { stages: rest }),
            None => Err(RouterError::PipelineExhausted.into()),
        }
    }

    /// Number of stages still ahead, the terminal stage included.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }
}

/// Ordered queue of middleware stages.
///
/// Registration appends; each request runs a copy extended with its own
/// terminal stage (see [`Pipeline::with_terminal`]), so the registered queue is
/// never mutated while requests are in flight.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the end of the queue.
    pub fn push(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Copy of this queue with `terminal` appended as its last stage.
    #[must_use]
    pub fn with_terminal(&self, terminal: Arc<dyn Middleware>) -> Pipeline {
        let mut stages = Vec::with_capacity(self.stages.len() + 1);
        stages.extend(self.stages.iter().map(Arc::clone));
        stages.push(terminal);
        Pipeline { stages }
    }

    /// Run the queue front to back.
    ///
    /// # Errors
    ///
    /// The first error returned by any stage.
    pub fn execute(&self, req: &mut Request) -> anyhow::Result<Response> {
        Next {
            stages: &self.stages,
        }
        .run(req)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(label: &'static str) -> Arc<dyn Middleware> {
        Arc::new(from_fn(move |req: &mut Request, next: Next<'_>| {
            let mut res = Response::text(200, format!("{label}>"));
            let inner = next.run(req)?;
            res.write(&inner.body);
            res.write(format!("<{label}"));
            Ok(res)
        }))
    }

    fn terminal() -> Arc<dyn Middleware> {
        Arc::new(from_fn(|_req: &mut Request, _next: Next<'_>| {
            Ok(Response::text(200, "T"))
        }))
    }

    #[test]
    fn test_onion_order() {
        let mut pipeline = Pipeline::new();
        pipeline.push(tag("A"));
        pipeline.push(tag("B"));
        let run = pipeline.with_terminal(terminal());
        let res = run.execute(&mut Request::new("GET", "/")).unwrap();
        assert_eq!(res.body_string(), "A>B>T<B<A");
        // the registered queue is untouched
        assert_eq!(pipeline.len(), 2);
        assert_eq!(run.len(), 3);
    }

    #[test]
    fn test_exhausted_pipeline_is_an_error() {
        let err = Pipeline::new()
            .execute(&mut Request::new("GET", "/"))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RouterError>(),
            Some(&RouterError::PipelineExhausted)
        );
    }

    #[test]
    fn test_remaining_counts_terminal() {
        let mut pipeline = Pipeline::new();
        pipeline.push(Arc::new(from_fn(|req: &mut Request, next: Next<'_>| {
            let remaining = next.remaining();
            let mut res = next.run(req)?;
            res.set_header("x-remaining", remaining.to_string());
            Ok(res)
        })));
        let res = pipeline
            .with_terminal(terminal())
            .execute(&mut Request::new("GET", "/"))
            .unwrap();
        assert_eq!(res.header("x-remaining"), Some("1"));
    }
}
