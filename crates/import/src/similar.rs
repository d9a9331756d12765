use ledgerlight_core::{contains_either_way, normalize, BankTransaction};

/// Transactions whose normalised description contains, or is contained by,
/// the source description. A transaction is always similar to itself.
pub fn find_similar<'a>(
    description: &str,
    candidates: &'a [BankTransaction],
) -> Vec<&'a BankTransaction> {
    let source = normalize(description);
    candidates
        .iter()
        .filter(|tx| contains_either_way(&source, &normalize(&tx.description)))
        .collect()
}

/// Copies the source's category pair onto every similar transaction,
/// the source included. Returns the rewritten list in its original order
/// plus how many rows were touched.
pub fn apply_category_to_similar(
    source: &BankTransaction,
    all: Vec<BankTransaction>,
) -> (Vec<BankTransaction>, usize) {
    let wanted = normalize(&source.description);
    let mut touched = 0;
    let updated = all
        .into_iter()
        .map(|mut tx| {
            if contains_either_way(&wanted, &normalize(&tx.description)) {
                tx.category = source.category.clone();
                tx.subcategory = source.subcategory.clone();
                touched += 1;
            }
            tx
        })
        .collect();
    (updated, touched)
}
