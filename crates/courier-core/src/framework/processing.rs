//! Pre- and post-processors.
//!
//! Pre-processors run before the rest of the pipeline and may mutate the
//! request. Post-processors run after it and may replace the response.
//! Both declare an [`order`](PreProcessor::order), used by [`ByOrder`].
//!
//! Default ordering differs between the two: pre-processors are always sorted
//! by declared order unless a comparer is registered, post-processors keep
//! registration order unless a comparer is registered.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::message::{Request, short_type_name};
use crate::foundation::ordering::{Comparer, Fallback, arrange};
use crate::framework::middleware::{Middleware, Next};

/// Runs before the handler of request `R`.
#[async_trait]
pub trait PreProcessor<R: Request>: Send + Sync {
    /// Position among the pre-processors of `R`. Lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Inspects or mutates `request`.
    async fn process(&self, request: &mut R, cancel: &CancellationToken) -> MediatorResult<()>;
}

/// Runs after the handler of request `R`.
#[async_trait]
pub trait PostProcessor<R: Request>: Send + Sync {
    /// Position among the post-processors of `R`. Lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Inspects or replaces the response held by `context`.
    async fn process(
        &self,
        request: &R,
        context: &mut PostProcessorContext<R::Output>,
        cancel: &CancellationToken,
    ) -> MediatorResult<()>;
}

/// The response as it travels through the post-processors.
#[derive(Debug)]
pub struct PostProcessorContext<T> {
    response: T,
}

impl<T> PostProcessorContext<T> {
    /// Wraps the handler's response.
    pub fn new(response: T) -> Self {
        Self { response }
    }

    /// The current response.
    pub fn response(&self) -> &T {
        &self.response
    }

    /// Mutable access to the current response.
    pub fn response_mut(&mut self) -> &mut T {
        &mut self.response
    }

    /// Replaces the current response.
    pub fn set_response(&mut self, response: T) {
        self.response = response;
    }

    /// Consumes the context, returning the final response.
    pub fn into_response(self) -> T {
        self.response
    }
}

/// Compares processors by their declared order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ByOrder;

impl<R: Request> Comparer<dyn PreProcessor<R>> for ByOrder {
    fn compare(
        &self,
        a: &(dyn PreProcessor<R> + 'static),
        b: &(dyn PreProcessor<R> + 'static),
    ) -> Ordering {
        a.order().cmp(&b.order())
    }
}

impl<R: Request> Comparer<dyn PostProcessor<R>> for ByOrder {
    fn compare(
        &self,
        a: &(dyn PostProcessor<R> + 'static),
        b: &(dyn PostProcessor<R> + 'static),
    ) -> Ordering {
        a.order().cmp(&b.order())
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Runs the pre-processors of `R`, then the rest of the pipeline.
pub struct PreProcessingMiddleware<R: Request> {
    processors: Vec<Arc<dyn PreProcessor<R>>>,
}

impl<R: Request> PreProcessingMiddleware<R> {
    /// Orders `processors` with `comparer`, or by declared order without one.
    pub fn new(
        mut processors: Vec<Arc<dyn PreProcessor<R>>>,
        comparer: Option<&dyn Comparer<dyn PreProcessor<R>>>,
    ) -> Self {
        let comparer = comparer.unwrap_or(&ByOrder);
        arrange(&mut processors, Some(comparer), Fallback::RegistrationOrder);
        Self { processors }
    }

    /// Returns the number of processors.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Returns `true` when there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[async_trait]
impl<R: Request> Middleware<R> for PreProcessingMiddleware<R> {
    fn name(&self) -> &'static str {
        "PreProcessingMiddleware"
    }

    async fn execute(
        &self,
        request: &mut R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output> {
        for processor in &self.processors {
            if cancel.is_cancelled() {
                return Err(MediatorError::Cancelled);
            }
            trace!(request = short_type_name::<R>(), order = processor.order(), "Running pre-processor");
            processor.process(request, cancel).await?;
        }
        next.run(request).await
    }
}

/// Runs the rest of the pipeline, then the post-processors of `R`.
pub struct PostProcessingMiddleware<R: Request> {
    processors: Vec<Arc<dyn PostProcessor<R>>>,
}

impl<R: Request> PostProcessingMiddleware<R> {
    /// Orders `processors` with `comparer`, or keeps registration order
    /// without one.
    pub fn new(
        mut processors: Vec<Arc<dyn PostProcessor<R>>>,
        comparer: Option<&dyn Comparer<dyn PostProcessor<R>>>,
    ) -> Self {
        arrange(&mut processors, comparer, Fallback::RegistrationOrder);
        Self { processors }
    }

    /// Returns the number of processors.
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Returns `true` when there is nothing to run.
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

#[async_trait]
impl<R: Request> Middleware<R> for PostProcessingMiddleware<R> {
    fn name(&self) -> &'static str {
        "PostProcessingMiddleware"
    }

    async fn execute(
        &self,
        request: &mut R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output> {
        let response = next.run(request).await?;
        let mut context = PostProcessorContext::new(response);
        for processor in &self.processors {
            trace!(request = short_type_name::<R>(), order = processor.order(), "Running post-processor");
            processor.process(request, &mut context, cancel).await?;
        }
        Ok(context.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::ordering::comparer_fn;
    use crate::framework::handler::RequestHandler;

    struct Calculate {
        value: i32,
        multiplier: i32,
    }

    impl Request for Calculate {
        type Output = i32;
    }

    struct CalculateHandler;

    #[async_trait]
    impl RequestHandler<Calculate> for CalculateHandler {
        async fn handle(&self, request: &Calculate, _cancel: &CancellationToken) -> MediatorResult<i32> {
            Ok(request.value * request.multiplier)
        }
    }

    struct DoubleMultiplier(i32);

    #[async_trait]
    impl PreProcessor<Calculate> for DoubleMultiplier {
        fn order(&self) -> i32 {
            self.0
        }

        async fn process(&self, request: &mut Calculate, _cancel: &CancellationToken) -> MediatorResult<()> {
            request.multiplier *= 2;
            Ok(())
        }
    }

    struct AddTenToMultiplier(i32);

    #[async_trait]
    impl PreProcessor<Calculate> for AddTenToMultiplier {
        fn order(&self) -> i32 {
            self.0
        }

        async fn process(&self, request: &mut Calculate, _cancel: &CancellationToken) -> MediatorResult<()> {
            request.multiplier += 10;
            Ok(())
        }
    }

    struct UseConstant;

    #[async_trait]
    impl PostProcessor<Calculate> for UseConstant {
        fn order(&self) -> i32 {
            1
        }

        async fn process(
            &self,
            _request: &Calculate,
            context: &mut PostProcessorContext<i32>,
            _cancel: &CancellationToken,
        ) -> MediatorResult<()> {
            context.set_response(13);
            Ok(())
        }
    }

    struct DoubleOutput;

    #[async_trait]
    impl PostProcessor<Calculate> for DoubleOutput {
        fn order(&self) -> i32 {
            2
        }

        async fn process(
            &self,
            _request: &Calculate,
            context: &mut PostProcessorContext<i32>,
            _cancel: &CancellationToken,
        ) -> MediatorResult<()> {
            *context.response_mut() *= 2;
            Ok(())
        }
    }

    async fn run(middleware: impl Middleware<Calculate> + 'static, request: &mut Calculate) -> MediatorResult<i32> {
        let chain: Vec<Arc<dyn Middleware<Calculate>>> = vec![Arc::new(middleware)];
        let cancel = CancellationToken::new();
        Next::new(&chain, &CalculateHandler, &cancel).run(request).await
    }

    #[tokio::test]
    async fn test_pre_processors_mutate_request() {
        let processors: Vec<Arc<dyn PreProcessor<Calculate>>> =
            vec![Arc::new(DoubleMultiplier(0)), Arc::new(DoubleMultiplier(0))];
        let middleware = PreProcessingMiddleware::new(processors, None);
        let mut request = Calculate { value: 5, multiplier: 1 };

        assert_eq!(run(middleware, &mut request).await.unwrap(), 20);
        assert_eq!(request.multiplier, 4);
    }

    #[tokio::test]
    async fn test_pre_processors_run_by_declared_order() {
        let processors: Vec<Arc<dyn PreProcessor<Calculate>>> = vec![
            Arc::new(DoubleMultiplier(3)),
            Arc::new(AddTenToMultiplier(0)),
            Arc::new(DoubleMultiplier(4)),
            Arc::new(AddTenToMultiplier(1)),
            Arc::new(AddTenToMultiplier(2)),
        ];
        let middleware = PreProcessingMiddleware::new(processors, None);
        let mut request = Calculate { value: 5, multiplier: 1 };

        // (1 + 10 + 10 + 10) * 2 * 2 = 124, times 5.
        assert_eq!(run(middleware, &mut request).await.unwrap(), 620);
    }

    #[tokio::test]
    async fn test_pre_processor_comparer_overrides_order() {
        let processors: Vec<Arc<dyn PreProcessor<Calculate>>> = vec![
            Arc::new(DoubleMultiplier(0)),
            Arc::new(AddTenToMultiplier(1)),
        ];
        let descending =
            comparer_fn::<dyn PreProcessor<Calculate>, _>(|a, b| b.order().cmp(&a.order()));
        let middleware = PreProcessingMiddleware::new(processors, Some(&descending));
        let mut request = Calculate { value: 1, multiplier: 1 };

        // Add ten first, then double.
        assert_eq!(run(middleware, &mut request).await.unwrap(), 22);
    }

    #[tokio::test]
    async fn test_post_processor_overwrites_response() {
        let processors: Vec<Arc<dyn PostProcessor<Calculate>>> = vec![Arc::new(UseConstant)];
        let middleware = PostProcessingMiddleware::new(processors, None);
        let mut request = Calculate { value: 2, multiplier: 3 };

        assert_eq!(run(middleware, &mut request).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_post_processors_keep_registration_order_without_comparer() {
        let processors: Vec<Arc<dyn PostProcessor<Calculate>>> = vec![
            Arc::new(DoubleOutput),
            Arc::new(DoubleOutput),
            Arc::new(UseConstant),
        ];
        let middleware = PostProcessingMiddleware::new(processors, None);
        let mut request = Calculate { value: 1, multiplier: 1 };

        assert_eq!(run(middleware, &mut request).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_post_processors_sorted_by_order_comparer() {
        let processors: Vec<Arc<dyn PostProcessor<Calculate>>> = vec![
            Arc::new(DoubleOutput),
            Arc::new(DoubleOutput),
            Arc::new(UseConstant),
        ];
        let middleware = PostProcessingMiddleware::new(processors, Some(&ByOrder));
        let mut request = Calculate { value: 1, multiplier: 1 };

        assert_eq!(run(middleware, &mut request).await.unwrap(), 52);
    }

    #[tokio::test]
    async fn test_post_processing_skipped_on_failure() {
        struct Broken;

        #[async_trait]
        impl PreProcessor<Calculate> for Broken {
            async fn process(&self, _request: &mut Calculate, _cancel: &CancellationToken) -> MediatorResult<()> {
                Err(crate::foundation::fault::Fault::msg("bad input").into())
            }
        }

        let post: Vec<Arc<dyn PostProcessor<Calculate>>> = vec![Arc::new(UseConstant)];
        let pre: Vec<Arc<dyn PreProcessor<Calculate>>> = vec![Arc::new(Broken)];
        let chain: Vec<Arc<dyn Middleware<Calculate>>> = vec![
            Arc::new(PostProcessingMiddleware::new(post, None)),
            Arc::new(PreProcessingMiddleware::new(pre, None)),
        ];
        let cancel = CancellationToken::new();
        let mut request = Calculate { value: 1, multiplier: 1 };

        let result = Next::new(&chain, &CalculateHandler, &cancel).run(&mut request).await;
        assert_eq!(result.unwrap_err().to_string(), "error: bad input");
    }
}
