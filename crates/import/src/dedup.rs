use ledgerlight_core::BankTransaction;
use std::collections::HashSet;

/// Flags rows whose id was seen in an earlier import. Nothing is removed;
/// the flag is the only field touched.
pub fn mark_duplicates(
    mut parsed: Vec<BankTransaction>,
    existing_ids: &HashSet<String>,
) -> Vec<BankTransaction> {
    mark_duplicates_in_place(&mut parsed, existing_ids);
    parsed
}

/// Returns how many rows were flagged.
pub fn mark_duplicates_in_place(
    parsed: &mut [BankTransaction],
    existing_ids: &HashSet<String>,
) -> usize {
    let mut flagged = 0;
    for tx in parsed.iter_mut() {
        if existing_ids.contains(&tx.id) {
            tx.is_duplicate = true;
            flagged += 1;
        }
    }
    flagged
}

/// Sets or clears the duplicate flag of every row with this id. Returns
/// whether any row matched.
pub fn override_duplicate(transactions: &mut [BankTransaction], id: &str, duplicate: bool) -> bool {
    let mut found = false;
    for tx in transactions.iter_mut().filter(|tx| tx.id == id) {
        tx.is_duplicate = duplicate;
        found = true;
    }
    found
}
