use log::debug;

use crate::error::Result;
use crate::models::RepositoryKey;
use crate::providers::{PageRequest, RepositorySource, Resource};

const SCAN_PAGE_SIZE: u32 = 100;

/// Exact item count from one page-size-1 request.
///
/// With one item per page the advertised last page index is the item count.
/// A single page holds zero or one item. If the source reports more pages
/// without a last page index, the count falls back to a full scan.
pub async fn count_items<S>(source: &S, key: &RepositoryKey, resource: Resource) -> Result<u64>
where
    S: RepositorySource + ?Sized,
{
    let page = source
        .list_page(key, &PageRequest::first(resource, 1))
        .await?;

    match page.last_page {
        Some(last) if last > 1 => Ok(u64::from(last)),
        _ if !page.has_more() => Ok(page.items.len() as u64),
        _ => {
            debug!(
                "{key} {}: no last page advertised, scanning",
                resource.label()
            );
            count_up_to(source, key, resource, u64::MAX).await
        }
    }
}

/// Accumulates pages of 100 until the running total reaches `cap` or the
/// collection ends. The result may exceed `cap` by at most one page.
pub async fn count_up_to<S>(
    source: &S,
    key: &RepositoryKey,
    resource: Resource,
    cap: u64,
) -> Result<u64>
where
    S: RepositorySource + ?Sized,
{
    let mut request = PageRequest::first(resource, SCAN_PAGE_SIZE);
    let mut total = 0u64;

    loop {
        let page = source.list_page(key, &request).await?;
        if page.items.is_empty() {
            break;
        }
        total += page.items.len() as u64;
        if total >= cap {
            break;
        }
        match page.next_page {
            Some(next) => request = request.at(next),
            None => break,
        }
    }

    Ok(total)
}
