use tracing::{debug, info};

use crate::{BlockMemoryStore, BlockRepository, StoreError};

/// Fill the memory window from the repository at startup.
///
/// Pages are fetched strictly one after another; the next page is only
/// requested once the previous one has been pushed. Returns the number of
/// blocks read.
pub async fn warm_up(
    store: &BlockMemoryStore,
    repository: &dyn BlockRepository,
    limit: usize,
) -> Result<usize, StoreError> {
    let limit = limit.max(1);
    let mut offset = 0;

    loop {
        let page = repository.get_many(limit, offset).await?;
        let page_len = page.len();

        debug!(offset = offset, blocks = page_len, "Loaded warm-up page");

        for block in page {
            store.push(block);
        }

        offset += page_len;
        if page_len < limit {
            break;
        }
    }

    info!(
        loaded = offset,
        in_memory = store.len(),
        "Block warm-up finished"
    );

    Ok(offset)
}
