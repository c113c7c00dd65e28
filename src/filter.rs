use crate::normalization::NormalizedSale;
use crate::range::DateRange;

/// Approved-equivalent status check.
pub fn is_approved(sale: &NormalizedSale) -> bool {
    sale.is_approved()
}

/// Whether the sale falls inside `range` (inclusive). A sale without a
/// parsable date never does; with no range, every sale does.
pub fn in_range(sale: &NormalizedSale, range: Option<&DateRange>) -> bool {
    match range {
        None => true,
        Some(range) => sale.occurred_at.is_some_and(|at| range.contains(at)),
    }
}

/// Sale Filter: approved sales inside the (already normalized) range, in
/// their original order.
pub fn filter_sales(sales: &[NormalizedSale], range: Option<&DateRange>) -> Vec<NormalizedSale> {
    let filtered: Vec<NormalizedSale> = sales
        .iter()
        .filter(|sale| is_approved(sale) && in_range(sale, range))
        .cloned()
        .collect();

    tracing::debug!(
        "Sale filter kept {} of {} record(s) (range: {})",
        filtered.len(),
        sales.len(),
        range.is_some()
    );

    filtered
}
