// Example: drive the cache by hand through a simulated scroll.
//
// A host would:
// - report the retained ranges whenever the list scrolls
// - call poll_fetch(now_ms) from its timer once the debounce deadline passes
// - run each FetchRequest against the backend and hand the result to complete_fetch
use itemcache::{
    CacheOptions, FeedEvent, FetchOutcome, FetchRequest, TrackedRanges, VirtualizedFeed,
};

fn backend(req: &FetchRequest) -> FetchOutcome<String> {
    FetchOutcome::Fetched(req.range.indices().map(|i| format!("row #{i}")).collect())
}

fn main() {
    let mut feed = VirtualizedFeed::new(|| 10_000, CacheOptions::new().with_batch_size(32))
        .with_on_event(Some(|event: FeedEvent<'_, String>| {
            if let FeedEvent::Replaced(change) = event {
                if change.index % 16 == 0 {
                    println!("  replaced index={} value={:?}", change.index, change.new);
                }
            }
        }));

    let mut now_ms = 0u64;
    for burst in [[0usize, 8, 16, 24], [400, 405, 410, 415]] {
        // Scroll events arrive every 16ms, faster than the debounce delay.
        for top in burst {
            let mut ranges = TrackedRanges::new(feed.count(), top, top + 20);
            ranges.emit_overscanned(10, 30);
            let (visible, tracked) = ranges.finish();
            let Some(visible) = visible else {
                continue;
            };
            let changed = feed.on_ranges_changed(visible, &tracked, now_ms);
            println!("t={now_ms} visible={visible} tracked={tracked:?} changed={changed}");
            now_ms += 16;
        }

        now_ms += 50;
        let mut next = feed.poll_fetch(now_ms);
        while let Some(req) = next {
            println!("  fetch {}", req.range);
            next = match feed.complete_fetch(req.ticket, backend(&req), now_ms) {
                Ok(next) => next,
                Err(err) => {
                    println!("  fetch failed: {err}");
                    None
                }
            };
        }
        println!("snapshot={:?}", feed.cache().snapshot());
    }

    println!("item 420={:?}", feed.get(420));
    println!("item 10={:?}", feed.get(10));
}
