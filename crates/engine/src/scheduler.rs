use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{error, info, warn};

use common::{Error, Gate, Result, ScanCommand, ScanStatus};
use strategy::ScanConfig;

use crate::alerts::PriceAlertChecker;
use crate::scanner::UniverseScanner;

/// Unit of scheduled work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Needed,
    Sufficient,
    Alerts,
}

impl std::fmt::Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Needed => write!(f, "needed-pass"),
            Job::Sufficient => write!(f, "sufficient-pass"),
            Job::Alerts => write!(f, "holding-alerts"),
        }
    }
}

impl From<ScanCommand> for Job {
    fn from(cmd: ScanCommand) -> Self {
        match cmd {
            ScanCommand::RunNeeded => Job::Needed,
            ScanCommand::RunSufficient => Job::Sufficient,
            ScanCommand::CheckAlerts => Job::Alerts,
        }
    }
}

/// Cloneable handle passed to the Telegram bot.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<ScanCommand>,
    status: Arc<RwLock<ScanStatus>>,
}

impl SchedulerHandle {
    pub async fn send(&self, cmd: ScanCommand) {
        if self.command_tx.send(cmd).await.is_err() {
            warn!(?cmd, "Scheduler is not running, command dropped");
        }
    }

    pub async fn status(&self) -> ScanStatus {
        self.status.read().await.clone()
    }
}

/// Runs passes on their cron cadences and on demand.
///
/// Each job has its own run guard: a trigger that arrives while the previous
/// run of the same job is still in flight is skipped.
pub struct Scheduler {
    scanner: Arc<UniverseScanner>,
    alerts: Arc<PriceAlertChecker>,
    schedules: Vec<(Job, Schedule)>,
    status: Arc<RwLock<ScanStatus>>,
    command_rx: mpsc::Receiver<ScanCommand>,
    guards: [Arc<Mutex<()>>; 3],
}

impl Scheduler {
    pub fn new(
        scanner: Arc<UniverseScanner>,
        alerts: Arc<PriceAlertChecker>,
        cfg: &ScanConfig,
    ) -> Result<(Self, SchedulerHandle)> {
        let mut schedules = Vec::new();
        for (job, exprs) in [
            (Job::Needed, &cfg.needed_schedules),
            (Job::Sufficient, &cfg.sufficient_schedules),
            (Job::Alerts, &cfg.alert_schedules),
        ] {
            for expr in exprs {
                let schedule = Schedule::from_str(expr).map_err(|e| {
                    Error::Config(format!("invalid cron expression '{expr}' for {job}: {e}"))
                })?;
                schedules.push((job, schedule));
            }
        }

        let (command_tx, command_rx) = mpsc::channel(16);
        let status = Arc::new(RwLock::new(ScanStatus::default()));
        let handle = SchedulerHandle {
            command_tx,
            status: status.clone(),
        };

        let scheduler = Scheduler {
            scanner,
            alerts,
            schedules,
            status,
            command_rx,
            guards: Default::default(),
        };
        Ok((scheduler, handle))
    }

    /// Earliest upcoming fire time after `now` and every job due at it.
    pub fn next_due(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<Job>)> {
        let upcoming: Vec<(Job, DateTime<Utc>)> = self
            .schedules
            .iter()
            .filter_map(|(job, s)| s.after(&now).next().map(|at| (*job, at)))
            .collect();
        let at = upcoming.iter().map(|(_, at)| *at).min()?;
        let mut jobs: Vec<Job> = upcoming
            .into_iter()
            .filter(|(_, t)| *t == at)
            .map(|(job, _)| job)
            .collect();
        jobs.dedup();
        Some((at, jobs))
    }

    /// Run the scheduler loop. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(schedules = self.schedules.len(), "Scheduler running");
        loop {
            let due = self.next_due(Utc::now());
            let sleep = match &due {
                Some((at, _)) => (*at - Utc::now()).to_std().unwrap_or_default(),
                None => std::time::Duration::from_secs(3600),
            };

            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => {
                        info!(?cmd, "On-demand run requested");
                        self.trigger(cmd.into()).await;
                    }
                    None => {
                        warn!("Scheduler command channel closed, shutting down");
                        break;
                    }
                },
                _ = tokio::time::sleep(sleep) => {
                    if let Some((_, jobs)) = due {
                        for job in jobs {
                            self.trigger(job).await;
                        }
                    }
                }
            }
        }
    }

    /// Start `job` in the background unless its previous run is still going.
    /// Returns `false` when skipped.
    pub async fn trigger(&self, job: Job) -> bool {
        let guard = match self.guard(job).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(%job, "Previous run still in progress, skipping");
                return false;
            }
        };

        let gate = match job {
            Job::Needed => Some(Gate::Needed),
            Job::Sufficient => Some(Gate::Sufficient),
            Job::Alerts => None,
        };
        if let Some(gate) = gate {
            self.status.write().await.set_running(gate, true);
        }

        let scanner = self.scanner.clone();
        let alerts = self.alerts.clone();
        let status = self.status.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let outcome = match job {
                Job::Needed => scanner.needed_pass().await.map(Some),
                Job::Sufficient => scanner.sufficient_pass().await.map(Some),
                Job::Alerts => alerts.check().await.map(|_| None),
            };

            let mut status = status.write().await;
            if let Some(gate) = gate {
                status.set_running(gate, false);
            }
            match outcome {
                Ok(Some(report)) => status.record(report),
                Ok(None) => {}
                Err(e) => error!(%job, error = %e, "Run aborted, retrying on next tick"),
            }
        });
        true
    }

    fn guard(&self, job: Job) -> Arc<Mutex<()>> {
        let idx = match job {
            Job::Needed => 0,
            Job::Sufficient => 1,
            Job::Alerts => 2,
        };
        self.guards[idx].clone()
    }
}
