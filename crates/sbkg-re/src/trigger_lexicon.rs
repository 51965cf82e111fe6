//! Trigger-verb lexicon (§4.5 extractor 1): surface forms whose presence
//! between two compatible mentions signals a predicate.

use sbkg_common::Predicate;

pub fn triggers_for(predicate: Predicate) -> &'static [&'static str] {
    use Predicate::*;
    match predicate {
        Upregulates => &["induce", "induces", "induced", "increase", "increases", "increased", "elevate", "elevates", "elevated", "upregulate", "upregulates", "upregulated"],
        Downregulates => &["decrease", "decreases", "decreased", "reduce", "reduces", "reduced", "suppress", "suppresses", "suppressed", "inhibit", "inhibits", "inhibited", "downregulate", "downregulates", "downregulated"],
        Causes => &["cause", "causes", "caused", "lead to", "leads to", "led to", "result in", "results in", "resulted in"],
        Treats => &["treat", "treats", "treated", "alleviate", "alleviates", "alleviated", "improve", "improves", "improved"],
        Prevents => &["prevent", "prevents", "prevented", "protect against", "protects against", "protected against"],
        InteractsWith => &["interact with", "interacts with", "interacted with", "bind", "binds", "bound", "associate with", "associates with"],
        PartOf => &["part of", "component of", "located in", "found in"],
        AssociatedWith => &[],
    }
}

/// Predicates with a non-empty trigger lexicon — the ones the
/// dependency-pattern and surface-pattern extractors can fire on.
pub fn triggerable_predicates() -> [Predicate; 7] {
    [
        Predicate::Upregulates,
        Predicate::Downregulates,
        Predicate::Causes,
        Predicate::Treats,
        Predicate::Prevents,
        Predicate::InteractsWith,
        Predicate::PartOf,
    ]
}
