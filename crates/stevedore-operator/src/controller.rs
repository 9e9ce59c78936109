//! kube-runtime controller driving [`Reconciler`] for every Installation
//!
//! Successful and skipped reconciles wait for the next change. Failed
//! attempts, and errors persisting status, are retried after
//! `retryInterval`.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::{
    Api, ResourceExt,
    api::ListParams,
    runtime::{
        controller::{Action, Controller},
        watcher::Config as WatcherConfig,
    },
};
use stevedore_core::Installation;
use stevedore_kube::{InstallError, KubeError, Outcome};
use tracing::{debug, error, info, warn};

use crate::OperatorReconciler;
use crate::error::OperatorError;

struct Context {
    reconciler: OperatorReconciler,
    retry_interval: Duration,
}

/// Watch all Installations until a shutdown signal arrives
pub async fn run(reconciler: OperatorReconciler) -> Result<(), OperatorError> {
    let installations: Api<Installation> = Api::all(reconciler.cluster().client().clone());

    // Fail fast when the CRD is not registered
    installations
        .list(&ListParams::default().limit(1))
        .await
        .map_err(KubeError::Api)?;

    let retry_interval = reconciler.config().retry_interval;
    let ctx = Arc::new(Context {
        reconciler,
        retry_interval,
    });

    info!(retry_interval = ?retry_interval, "Starting Installation controller");

    Controller::new(installations, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    debug!(installation = %obj.name, ?action, "Reconciliation completed");
                }
                Err(e) => {
                    warn!(error = %e, "Reconciliation error");
                }
            }
        })
        .await;

    info!("Installation controller stopped");
    Ok(())
}

async fn reconcile(
    installation: Arc<Installation>,
    ctx: Arc<Context>,
) -> Result<Action, InstallError> {
    let outcome = ctx.reconciler.reconcile(&installation.name_any()).await?;
    Ok(next_action(&outcome, ctx.retry_interval))
}

fn error_policy(
    installation: Arc<Installation>,
    error: &InstallError,
    ctx: Arc<Context>,
) -> Action {
    error!(
        installation = %installation.name_any(),
        category = error.category(),
        error = %error,
        "Reconcile failed"
    );
    Action::requeue(ctx.retry_interval)
}

fn next_action(outcome: &Outcome, retry_interval: Duration) -> Action {
    if outcome.is_failure() {
        Action::requeue(retry_interval)
    } else {
        Action::await_change()
    }
}
