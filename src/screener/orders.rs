//! Paid-order ("dex paid") lookup for the ranked finalists.

use crate::screener::data_sources::MarketDataProvider;
use crate::screener::types::DebugRecord;
use crate::types::Row;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Attach `orders_count` and `isDexPaid` to every finalist.
///
/// Failed lookups come back empty and mark the row as not paid.
#[instrument(skip_all, fields(finalists = rows.len()))]
pub async fn augment_with_orders(
    provider: &dyn MarketDataProvider,
    chain_id: &str,
    rows: &mut [Row],
    debug: &mut DebugRecord,
) {
    let mut orders_debug = BTreeMap::new();

    for row in rows.iter_mut() {
        let token_address = row.token_address().trim().to_string();
        if token_address.is_empty() {
            continue;
        }

        let fetched = provider.fetch_orders_for_token(chain_id, &token_address).await;
        let count = fetched.records.len();
        debug!("{} paid orders for {}", count, token_address);

        orders_debug.insert(token_address.chars().take(6).collect(), fetched.debug);
        row.orders_count = Some(count);
        row.is_dex_paid = Some(count > 0);
    }

    debug.api_debug.orders = Some(orders_debug);
}
