use executors::{ExecutorResult, Pool};
use std::{thread, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};


fn main() -> ExecutorResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "executors=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = Pool::new("demo-pool", 2, 50)?;

    let futures = ["Job1", "Job2", "Job3"]
        .into_iter()
        .map(|name| {
            pool.submit(move || {
                thread::sleep(Duration::from_millis(1000));
                format!("{name} Results")
            })
        })
        .collect::<ExecutorResult<Vec<_>>>()?;

    match futures[0].get(Duration::from_millis(100)) {
        Ok(res) => tracing::info!(%res, "first job finished early"),
        Err(err) => tracing::info!(%err, "first job still running"),
    }
    for future in &futures[1..] {
        match future.get(Duration::from_secs(5)) {
            Ok(res) => tracing::info!(%res, "job finished"),
            Err(err) => tracing::error!(%err, "job failed"),
        }
    }

    let metrics = pool.metrics();
    tracing::info!(
        submitted = metrics.total_submitted,
        completed = metrics.completed_tasks,
        "demo complete"
    );
    pool.shutdown();
    Ok(())
}
