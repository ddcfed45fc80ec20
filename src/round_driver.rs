use crate::pir_internals::{branch_opt_util, error::PIRError, params::Params};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

/// Drives protocol rounds on a bounded pool of worker threads, one per round.
///
/// Worker `r` keeps invoking the handler with round number `r` until [`RoundDriver::shutdown`] is called.
/// A handler failure is logged and the worker moves on to its next iteration, it never stops the pool.
#[derive(Debug)]
pub struct RoundDriver {
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    stopped: bool,
}

impl RoundDriver {
    /// Spawns `params.max_rounds()` workers, each looping over `handler`.
    ///
    /// # Arguments
    ///
    /// * `params`: Deployment parameters, decide how many rounds run concurrently.
    /// * `handler`: Runs one iteration of a round, given the round number in `[0, max_rounds)`.
    ///
    /// # Returns
    ///
    /// A `Result` holding the running driver. If any worker can't be spawned, already spawned ones are stopped
    /// and joined before returning the error.
    pub fn start<F>(params: &Params, handler: F) -> Result<RoundDriver, PIRError>
    where
        F: Fn(usize) -> Result<(), PIRError> + Send + Sync + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let handler = Arc::new(handler);

        let mut driver = RoundDriver {
            stop: stop.clone(),
            workers: Vec::with_capacity(params.max_rounds()),
            stopped: false,
        };

        for round in 0..params.max_rounds() {
            let stop = stop.clone();
            let handler = handler.clone();

            let spawned = thread::Builder::new().name(format!("pir-round-{}", round)).spawn(move || {
                let mut iteration = 0u64;

                while !stop.load(Ordering::Acquire) {
                    tracing::trace!(round, iteration, "Running round iteration");

                    if let Err(err) = (*handler)(round) {
                        tracing::warn!(round, iteration, "Round handler failed: {err}");
                    }
                    iteration = iteration.wrapping_add(1);
                }
            });

            match spawned {
                Ok(worker) => driver.workers.push(worker),
                Err(e) => {
                    branch_opt_util::cold();

                    let _ = driver.shutdown();
                    return Err(PIRError::FailedToSpawnRoundWorker(e.to_string()));
                }
            }
        }

        tracing::debug!(num_rounds = params.max_rounds(), "Started round driver");
        Ok(driver)
    }

    #[inline(always)]
    pub fn num_rounds(&self) -> usize {
        self.workers.len()
    }

    #[inline(always)]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Signals every worker to stop after its ongoing iteration, then waits for all of them.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all workers finished cleanly. Fails with the lowest round number whose worker panicked, or if the driver
    /// was already shut down.
    pub fn shutdown(&mut self) -> Result<(), PIRError> {
        if branch_opt_util::unlikely(self.stopped) {
            return Err(PIRError::RoundDriverAlreadyStopped);
        }

        self.stopped = true;
        self.stop.store(true, Ordering::Release);

        let mut first_panicked = None;
        for (round, worker) in self.workers.drain(..).enumerate() {
            if worker.join().is_err() {
                tracing::error!(round, "Round worker panicked");
                first_panicked.get_or_insert(round);
            }
        }

        match first_panicked {
            Some(round) => Err(PIRError::RoundWorkerPanicked(round)),
            None => {
                tracing::debug!("Round driver shut down");
                Ok(())
            }
        }
    }
}

impl Drop for RoundDriver {
    fn drop(&mut self) {
        if !self.stopped {
            let _ = self.shutdown();
        }
    }
}
