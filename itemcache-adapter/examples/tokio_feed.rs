// Example: a tokio-owned feed fed by a command channel.
//
// The list adapter only sends FeedCommand messages; the controller task debounces them, spawns
// fetch tasks and aborts the ones a later scroll made useless.
use std::time::Duration;

use itemcache::{CacheOptions, CancelToken, FetchOutcome, IndexRange, VirtualizedFeed};
use itemcache_adapter::{FeedCommand, FeedController};

async fn slow_backend(range: IndexRange, cancel: CancelToken) -> FetchOutcome<String> {
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        if cancel.is_cancelled() {
            return FetchOutcome::Cancelled;
        }
    }
    FetchOutcome::Fetched(range.indices().map(|i| format!("row #{i}")).collect())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let feed = VirtualizedFeed::new(|| 100_000, CacheOptions::new());
    let mut controller = FeedController::new(feed, slow_backend);

    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let owner = tokio::spawn(async move {
        let result = controller.run(rx).await;
        (controller, result)
    });

    for top in (0..2_000).step_by(250) {
        let visible = IndexRange::new(top, 20)?;
        let tracked = vec![IndexRange::new(top.saturating_sub(20), 80)?];
        if tx
            .send(FeedCommand::RangesChanged { visible, tracked })
            .await
            .is_err()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    drop(tx);

    let (controller, result) = owner.await?;
    println!("result={result:?}");
    println!("snapshot={:?}", controller.feed().cache().snapshot());
    println!("item 1760={:?}", controller.get(1_760));
    Ok(())
}
