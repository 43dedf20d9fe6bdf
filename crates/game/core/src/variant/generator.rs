use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use super::{BaseSubject, GeneratedVariant, compose_name, merge_stats};
use crate::config::{GameConfig, RarityWeights, VariantConfig};
use crate::defs::{AffixSlot, ModifierRecord, Rarity};

/// Draws prefixes and suffixes for a subject.
///
/// The generator holds only configuration. Modifier pools are passed per call,
/// normally straight from a registry snapshot, so one generator serves every
/// target kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariantGenerator {
    config: VariantConfig,
    weights: RarityWeights,
}

impl VariantGenerator {
    pub fn new(config: VariantConfig, weights: RarityWeights) -> Self {
        Self { config, weights }
    }

    pub fn from_config(config: &GameConfig) -> Self {
        Self::new(config.variants, config.rarity_weights)
    }

    /// Same rarity table, different chance and count limits.
    pub fn with_variant_config(&self, config: VariantConfig) -> Self {
        Self::new(config, self.weights)
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    pub fn weights(&self) -> &RarityWeights {
        &self.weights
    }

    /// Generates a variant of `subject` for `target` from `pool`.
    ///
    /// 1. Keep records applicable to `target`, split into prefix and suffix pools.
    /// 2. Roll `base_chance`; on failure return the subject unmodified.
    /// 3. For each non-empty pool draw a count in `[1, max_suffixes]`, capped
    ///    by the pool size, then pick that many records by weight without
    ///    replacement.
    /// 4. Compose the name, sum stat deltas, and union special effects.
    ///
    /// An empty pool simply contributes nothing.
    pub fn generate<'a, R>(
        &self,
        subject: &BaseSubject,
        target: &str,
        pool: impl IntoIterator<Item = &'a ModifierRecord>,
        rng: &mut R,
    ) -> GeneratedVariant
    where
        R: Rng + ?Sized,
    {
        let (prefix_pool, suffix_pool): (Vec<&ModifierRecord>, Vec<&ModifierRecord>) = pool
            .into_iter()
            .filter(|record| record.can_apply_to(target))
            .partition(|record| record.is_prefix());

        if !rng.gen_bool(self.config.clamped_chance()) {
            return GeneratedVariant::unmodified(subject);
        }

        let prefixes = self.draw_slot(prefix_pool, rng);
        let suffixes = self.draw_slot(suffix_pool, rng);

        let prefix_names: Vec<&str> = prefixes.iter().map(|m| m.display_name.as_str()).collect();
        let suffix_names: Vec<&str> = suffixes.iter().map(|m| m.display_name.as_str()).collect();

        let applied = || prefixes.iter().chain(suffixes.iter()).copied();

        GeneratedVariant {
            base_name: subject.name.clone(),
            final_name: compose_name(&prefix_names, &subject.name, &suffix_names),
            final_stats: merge_stats(&subject.stats, applied()),
            granted_effects: applied()
                .flat_map(|m| m.special_effects.iter().cloned())
                .collect(),
            prefixes: prefixes.iter().map(|m| m.id.clone()).collect(),
            suffixes: suffixes.iter().map(|m| m.id.clone()).collect(),
        }
    }

    /// Picks a single record by weight, optionally restricted to a slot and a
    /// rarity. Returns `None` when nothing is eligible.
    pub fn select_one<'a, R>(
        &self,
        pool: impl IntoIterator<Item = &'a ModifierRecord>,
        target: &str,
        slot: Option<AffixSlot>,
        rarity: Option<Rarity>,
        rng: &mut R,
    ) -> Option<&'a ModifierRecord>
    where
        R: Rng + ?Sized,
    {
        let candidates: Vec<&ModifierRecord> = pool
            .into_iter()
            .filter(|record| record.can_apply_to(target))
            .filter(|record| slot.is_none_or(|s| record.slot() == s))
            .filter(|record| rarity.is_none_or(|r| record.rarity == r))
            .collect();
        let weights: Vec<u32> = candidates
            .iter()
            .map(|record| record.weight(&self.weights))
            .collect();
        weighted_index(&weights, rng).map(|index| candidates[index])
    }

    fn slot_count<R>(&self, available: usize, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let max = self.config.max_suffixes as usize;
        if available == 0 || max == 0 {
            return 0;
        }
        rng.gen_range(1..=max).min(available)
    }

    fn draw_slot<'a, R>(
        &self,
        mut pool: Vec<&'a ModifierRecord>,
        rng: &mut R,
    ) -> Vec<&'a ModifierRecord>
    where
        R: Rng + ?Sized,
    {
        let count = self.slot_count(pool.len(), rng);
        let mut chosen = Vec::with_capacity(count);
        for _ in 0..count {
            let weights: Vec<u32> = pool
                .iter()
                .map(|record| record.weight(&self.weights))
                .collect();
            let Some(index) = weighted_index(&weights, rng) else {
                break;
            };
            chosen.push(pool.remove(index));
        }
        chosen
    }
}

/// Index drawn with probability proportional to its weight.
///
/// Returns `None` for an empty slice or when every weight is zero. Weights
/// are summed as `u64`, so any number of `u32::MAX` entries still draws.
pub fn weighted_index<R>(weights: &[u32], rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
{
    WeightedIndex::<u64>::new(weights.iter().map(|&weight| u64::from(weight)))
        .ok()
        .map(|distribution| distribution.sample(rng))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::rng::PcgRng;
    use crate::stats::StatBlock;

    fn imp() -> BaseSubject {
        BaseSubject::new("Imp", StatBlock::from([("attack", 5), ("corruption", 0)]))
    }

    fn brave() -> ModifierRecord {
        ModifierRecord::new("brave", "Brave", AffixSlot::Prefix, Rarity::Common).with_stat("attack", 2)
    }

    fn of_blight() -> ModifierRecord {
        ModifierRecord::new("of_blight", "of Blight", AffixSlot::Suffix, Rarity::Uncommon)
            .with_stat("corruption", 4)
            .with_effect("poison_immunity")
    }

    fn always() -> VariantGenerator {
        VariantGenerator::new(VariantConfig::new(1.0, 2), RarityWeights::default())
    }

    fn wide_pool() -> Vec<ModifierRecord> {
        let rarities = [
            Rarity::Common,
            Rarity::Uncommon,
            Rarity::Rare,
            Rarity::Legendary,
            Rarity::Common,
        ];
        let mut pool = Vec::new();
        for (i, rarity) in rarities.into_iter().enumerate() {
            let delta = i as i32;
            pool.push(
                ModifierRecord::new(format!("prefix_{i}"), format!("P{i}"), AffixSlot::Prefix, rarity)
                    .with_stat("attack", delta + 1)
                    .with_effect(format!("effect_p{i}")),
            );
            pool.push(
                ModifierRecord::new(format!("suffix_{i}"), format!("of S{i}"), AffixSlot::Suffix, rarity)
                    .with_stat("defense", -delta)
                    .with_stat("speed", 1),
            );
        }
        pool
    }

    #[test]
    fn brave_imp_of_blight() {
        let pool = [brave(), of_blight()];
        for seed in 0..50 {
            let mut rng = PcgRng::new(seed);
            let variant = always().generate(&imp(), "entity", &pool, &mut rng);
            assert_eq!(variant.final_name, "Brave Imp of Blight");
            assert_eq!(variant.final_stats.get("attack"), 7);
            assert_eq!(variant.final_stats.get("corruption"), 4);
            assert_eq!(
                variant.granted_effects,
                BTreeSet::from(["poison_immunity".to_owned()])
            );
            assert_eq!(variant.prefixes, vec!["brave"]);
            assert_eq!(variant.suffixes, vec!["of_blight"]);
        }
    }

    #[test]
    fn zero_chance_never_modifies() {
        let generator = VariantGenerator::new(VariantConfig::new(0.0, 3), RarityWeights::default());
        let pool = wide_pool();
        for seed in 0..200 {
            let mut rng = PcgRng::new(seed);
            let variant = generator.generate(&imp(), "entity", &pool, &mut rng);
            assert!(!variant.is_modified());
            assert_eq!(variant, GeneratedVariant::unmodified(&imp()));
        }
    }

    #[test]
    fn empty_prefix_pool_still_applies_suffixes() {
        let pool = [brave().with_target("entity"), of_blight()];
        for seed in 0..50 {
            let mut rng = PcgRng::new(seed);
            let variant = always().generate(&imp(), "weapon", &pool, &mut rng);
            assert!(variant.prefixes.is_empty());
            assert_eq!(variant.suffixes, vec!["of_blight"]);
            assert_eq!(variant.final_name, "Imp of Blight");
        }
    }

    #[test]
    fn zero_max_yields_no_modifiers() {
        let generator = VariantGenerator::new(VariantConfig::new(1.0, 0), RarityWeights::default());
        let mut rng = PcgRng::new(3);
        let variant = generator.generate(&imp(), "entity", &wide_pool(), &mut rng);
        assert!(!variant.is_modified());
        assert_eq!(variant.final_name, "Imp");
    }

    #[test]
    fn per_slot_count_never_exceeds_max() {
        let pool = wide_pool();
        for max in 1..=3u32 {
            let generator = VariantGenerator::new(VariantConfig::new(1.0, max), RarityWeights::default());
            for seed in 0..300 {
                let mut rng = PcgRng::new(seed);
                let variant = generator.generate(&imp(), "entity", &pool, &mut rng);
                assert!(!variant.prefixes.is_empty());
                assert!(!variant.suffixes.is_empty());
                assert!(variant.prefixes.len() <= max as usize);
                assert!(variant.suffixes.len() <= max as usize);

                let distinct: BTreeSet<&str> = variant.applied().collect();
                assert_eq!(distinct.len(), variant.modifier_count());
            }
        }
    }

    #[test]
    fn final_stats_are_base_plus_deltas() {
        let pool = wide_pool();
        let subject = imp();
        let generator = VariantGenerator::new(VariantConfig::weapon(), RarityWeights::default());
        for seed in 0..300 {
            let mut rng = PcgRng::new(seed);
            let variant = generator.generate(&subject, "entity", &pool, &mut rng);
            let applied: Vec<&ModifierRecord> = variant
                .applied()
                .filter_map(|id| pool.iter().find(|m| m.id == id))
                .collect();
            assert_eq!(applied.len(), variant.modifier_count());

            for stat in ["attack", "defense", "speed", "corruption"] {
                let expected = subject.stats.get(stat)
                    + applied.iter().map(|m| m.stat_modifiers.get(stat)).sum::<i32>();
                assert_eq!(variant.final_stats.get(stat), expected, "seed {seed} stat {stat}");
            }

            let effects: BTreeSet<String> = applied
                .iter()
                .flat_map(|m| m.special_effects.iter().cloned())
                .collect();
            assert_eq!(variant.granted_effects, effects);
        }
    }

    #[test]
    fn same_seed_same_variant() {
        let pool = wide_pool();
        let generator = always();
        let a = generator.generate(&imp(), "entity", &pool, &mut PcgRng::new(11));
        let b = generator.generate(&imp(), "entity", &pool, &mut PcgRng::new(11));
        assert_eq!(a, b);
    }

    #[test]
    fn selection_favours_higher_weight() {
        let pool = [
            ModifierRecord::new("common", "Common", AffixSlot::Prefix, Rarity::Common),
            ModifierRecord::new("legendary", "Legendary", AffixSlot::Prefix, Rarity::Legendary),
        ];
        let generator = always();
        let mut rng = PcgRng::new(2024);
        let mut common = 0u32;
        let mut legendary = 0u32;
        for _ in 0..10_000 {
            match generator.select_one(&pool, "entity", None, None, &mut rng) {
                Some(record) if record.id == "common" => common += 1,
                Some(_) => legendary += 1,
                None => panic!("pool is not empty"),
            }
        }
        // Expected split is 100:5, roughly 9524 to 476.
        assert!(common > 9_000, "common selected {common} times");
        assert!(legendary > 200, "legendary selected {legendary} times");
        assert!(common > legendary * 8);
    }

    #[test]
    fn select_one_applies_filters() {
        let pool = [brave(), of_blight()];
        let generator = always();
        let mut rng = PcgRng::new(5);
        let picked = generator.select_one(&pool, "entity", Some(AffixSlot::Suffix), None, &mut rng);
        assert_eq!(picked.map(|m| m.id.as_str()), Some("of_blight"));
        assert!(
            generator
                .select_one(&pool, "entity", None, Some(Rarity::Legendary), &mut rng)
                .is_none()
        );
    }

    #[test]
    fn weighted_index_rejects_empty_or_zero() {
        let mut rng = PcgRng::new(1);
        assert_eq!(weighted_index(&[], &mut rng), None);
        assert_eq!(weighted_index(&[0, 0], &mut rng), None);
        assert_eq!(weighted_index(&[0, 4, 0], &mut rng), Some(1));
    }

    #[test]
    fn huge_explicit_weights_still_draw() {
        let mut rng = PcgRng::new(3);
        assert!(weighted_index(&[u32::MAX, u32::MAX, 1], &mut rng).is_some());

        let pool = [
            brave().with_weight(u32::MAX),
            ModifierRecord::new("grim", "Grim", AffixSlot::Prefix, Rarity::Common)
                .with_stat("attack", 1)
                .with_weight(u32::MAX),
        ];
        for seed in 0..20 {
            let mut rng = PcgRng::new(seed);
            let variant = always().generate(&imp(), "entity", &pool, &mut rng);
            assert!(!variant.prefixes.is_empty());
        }
    }
}
