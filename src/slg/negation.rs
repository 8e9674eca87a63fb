//! Per-predicate stratification for well-founded negation: a predicate may
//! only negate predicates of equal or lower stratum, when enforced.
use std::collections::HashMap;

#[derive(Default)]
pub struct Strata {
    levels: HashMap<String, u32>,
}

impl Strata {
    pub fn new() -> Strata {
        Strata::default()
    }

    pub fn set(&mut self, levels: HashMap<String, u32>) {
        self.levels = levels;
    }

    pub fn level(&self, predicate: &str) -> u32 {
        self.levels.get(predicate).copied().unwrap_or(0)
    }

    /// `true` iff `negator` is permitted to negate a call to `negated`
    /// under strict stratification.
    pub fn may_negate(&self, negator: &str, negated: &str) -> bool {
        self.level(negator) >= self.level(negated)
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lower_stratum_cannot_be_negated_by_higher_caller() {
        let mut strata = Strata::new();
        let mut levels = HashMap::new();
        levels.insert("even".to_string(), 0);
        levels.insert("odd_via_even".to_string(), 1);
        strata.set(levels);
        assert!(strata.may_negate("odd_via_even", "even"));
        assert!(!strata.may_negate("even", "odd_via_even"));
    }
}
