use std::future::Future;

/// Runs post-commit side effects. Every external call after a lifecycle
/// transaction commits goes through here: the task must not block the caller,
/// must not fail the caller, and must not lose its error. Inline mode runs the
/// task to completion before returning and is what the test-suite uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Background,
    Inline,
}

#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    mode: DispatchMode,
}

impl Dispatcher {
    pub fn background() -> Self {
        Self {
            mode: DispatchMode::Background,
        }
    }

    pub fn inline() -> Self {
        Self {
            mode: DispatchMode::Inline,
        }
    }

    pub async fn dispatch<F>(&self, task: &'static str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        match self.mode {
            DispatchMode::Background => {
                tokio::spawn(async move {
                    if let Err(err) = fut.await {
                        tracing::error!(task, error = ?err, "side effect failed");
                    }
                });
            }
            DispatchMode::Inline => {
                if let Err(err) = fut.await {
                    tracing::error!(task, error = ?err, "side effect failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn inline_mode_runs_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        Dispatcher::inline()
            .dispatch("test_task", async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        Dispatcher::inline()
            .dispatch("failing_task", async { anyhow::bail!("boom") })
            .await;
        Dispatcher::background()
            .dispatch("failing_task", async { anyhow::bail!("boom") })
            .await;
    }
}
