//! Named, independently retried pipeline steps.

use folio_error::{
    FolioError, FolioErrorKind, FolioResult, JsonError, PipelineError, PipelineErrorKind,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Executes named steps with memoization and bounded retry.
///
/// A pipeline run decomposes into steps; a step that has completed is never
/// re-executed within the same run, so retrying a later step cannot repeat
/// an earlier side effect. Schema-invalid model output and retryable
/// provider errors retry the owning step; everything else propagates
/// immediately.
pub struct StepRunner {
    max_attempts: usize,
    completed: Mutex<HashMap<String, serde_json::Value>>,
}

impl StepRunner {
    /// Create a runner allowing `max_attempts` executions per step.
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            completed: Mutex::new(HashMap::new()),
        }
    }

    /// Run `op` under `step`, returning the memoized result if the step
    /// already completed in this run.
    pub async fn run<T, F, Fut>(&self, step: &str, op: F) -> FolioResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = FolioResult<T>>,
    {
        if let Some(value) = self.completed.lock().await.get(step) {
            debug!(step, "Step already committed, returning checkpoint");
            return serde_json::from_value(value.clone())
                .map_err(|e| JsonError::new(format!("Corrupt step checkpoint '{}': {}", step, e)).into());
        }

        let mut last_detail = String::new();
        for attempt in 1..=self.max_attempts {
            match op().await {
                Ok(value) => {
                    let checkpoint = serde_json::to_value(&value).map_err(|e| {
                        JsonError::new(format!("Unserializable step result '{}': {}", step, e))
                    })?;
                    self.completed
                        .lock()
                        .await
                        .insert(step.to_string(), checkpoint);
                    return Ok(value);
                }
                Err(e) if is_step_retryable(&e) && attempt < self.max_attempts => {
                    warn!(step, attempt, error = %e, "Step failed, retrying");
                    last_detail = e.to_string();
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                }
                Err(e) if is_step_retryable(&e) => {
                    last_detail = e.to_string();
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        Err(PipelineError::new(PipelineErrorKind::StepExhausted {
            step: step.to_string(),
            attempts: self.max_attempts,
            detail: last_detail,
        })
        .into())
    }
}

/// Whether an error retries the owning step.
///
/// Schema-invalid model output and transient provider failures do; fatal
/// taxonomy members (missing input, unparseable output, persistence) do not.
fn is_step_retryable(err: &FolioError) -> bool {
    match err.kind() {
        FolioErrorKind::Pipeline(p) => {
            matches!(p.kind, PipelineErrorKind::ModelOutputSchemaInvalid { .. })
        }
        FolioErrorKind::Model(m) => m.is_retryable(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema_invalid() -> FolioError {
        PipelineError::new(PipelineErrorKind::ModelOutputSchemaInvalid {
            step: "test".to_string(),
            detail: "bad role".to_string(),
        })
        .into()
    }

    #[tokio::test]
    async fn test_retries_schema_invalid_until_success() {
        let runner = StepRunner::new(3);
        let calls = AtomicUsize::new(0);

        let result: FolioResult<i32> = runner
            .run("flaky", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(schema_invalid())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_step_and_attempts() {
        let runner = StepRunner::new(2);
        let result: FolioResult<i32> = runner.run("hopeless", || async { Err(schema_invalid()) }).await;

        let err = result.unwrap_err();
        match err.kind() {
            FolioErrorKind::Pipeline(p) => match &p.kind {
                PipelineErrorKind::StepExhausted { step, attempts, .. } => {
                    assert_eq!(step, "hopeless");
                    assert_eq!(*attempts, 2);
                }
                other => panic!("unexpected kind: {}", other),
            },
            other => panic!("unexpected kind: {}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_errors_do_not_retry() {
        let runner = StepRunner::new(3);
        let calls = AtomicUsize::new(0);

        let result: FolioResult<i32> = runner
            .run("fatal", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::new(PipelineErrorKind::InputMissing(
                    "no pages".to_string(),
                ))
                .into())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completed_step_is_not_re_executed() {
        let runner = StepRunner::new(3);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: FolioResult<Vec<i64>> = runner
                .run("load", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await;
            assert_eq!(result.unwrap(), vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
