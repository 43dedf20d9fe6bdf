//! Kind-specific lookups layered on [`Registry`].

use std::sync::Arc;

use game_core::{
    AbilityDef, AbilityKind, AffixSlot, BuffDef, BuffKind, EntityKind, EntityTemplate,
    ModifierRecord, Rarity, StatusEffectDef,
};

use super::Registry;

impl Registry<ModifierRecord> {
    pub fn prefixes(&self) -> Vec<Arc<ModifierRecord>> {
        self.filter(ModifierRecord::is_prefix)
    }

    pub fn suffixes(&self) -> Vec<Arc<ModifierRecord>> {
        self.filter(ModifierRecord::is_suffix)
    }

    pub fn by_slot(&self, slot: AffixSlot) -> Vec<Arc<ModifierRecord>> {
        self.filter(|m| m.slot() == slot)
    }

    pub fn by_rarity(&self, rarity: Rarity) -> Vec<Arc<ModifierRecord>> {
        self.filter(|m| m.rarity == rarity)
    }

    /// Modifiers eligible for `target` (unrestricted ones included).
    pub fn applicable_to(&self, target: &str) -> Vec<Arc<ModifierRecord>> {
        self.filter(|m| m.can_apply_to(target))
    }

    /// Distinct single-prefix/single-suffix name shapes, counting "none" in
    /// each slot.
    pub fn combination_count(&self) -> usize {
        let table = self.snapshot();
        let prefixes = table.iter().filter(|m| m.is_prefix()).count();
        let suffixes = table.len() - prefixes;
        (prefixes + 1) * (suffixes + 1)
    }
}

impl Registry<EntityTemplate> {
    pub fn by_type(&self, kind: EntityKind) -> Vec<Arc<EntityTemplate>> {
        self.filter(|e| e.entity_type == kind)
    }

    pub fn bosses(&self) -> Vec<Arc<EntityTemplate>> {
        self.filter(|e| e.is_boss)
    }

    pub fn elites(&self) -> Vec<Arc<EntityTemplate>> {
        self.filter(|e| e.is_elite)
    }

    pub fn players(&self) -> Vec<Arc<EntityTemplate>> {
        self.by_type(EntityKind::Player)
    }

    pub fn enemies(&self) -> Vec<Arc<EntityTemplate>> {
        self.filter(EntityTemplate::is_enemy)
    }

    pub fn with_immunity(&self, effect: &str) -> Vec<Arc<EntityTemplate>> {
        self.filter(|e| e.is_immune_to(effect))
    }
}

impl Registry<BuffDef> {
    pub fn by_type(&self, kind: BuffKind) -> Vec<Arc<BuffDef>> {
        self.filter(|b| b.buff_type == kind)
    }

    pub fn temporary(&self) -> Vec<Arc<BuffDef>> {
        self.filter(|b| !b.is_permanent)
    }

    pub fn permanent(&self) -> Vec<Arc<BuffDef>> {
        self.filter(|b| b.is_permanent)
    }

    pub fn modifying_stat(&self, stat: &str) -> Vec<Arc<BuffDef>> {
        self.filter(|b| b.modifies(stat))
    }
}

impl Registry<AbilityDef> {
    pub fn by_kind(&self, kind: AbilityKind) -> Vec<Arc<AbilityDef>> {
        self.filter(|a| a.kind == kind)
    }
}

impl Registry<StatusEffectDef> {
    pub fn by_effect_type(&self, effect_type: &str) -> Vec<Arc<StatusEffectDef>> {
        self.filter(|s| s.effect_type.eq_ignore_ascii_case(effect_type))
    }
}

#[cfg(test)]
mod tests {
    use game_content::MemorySource;
    use game_core::StatBlock;

    use super::*;

    fn ids<T: game_content::ContentRecord>(records: &[Arc<T>]) -> Vec<&str> {
        records.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn modifier_queries() {
        let registry = Registry::new(MemorySource::new(
            "mem",
            vec![
                ModifierRecord::new("brave", "Brave", AffixSlot::Prefix, Rarity::Common),
                ModifierRecord::new("of_blight", "of Blight", AffixSlot::Suffix, Rarity::Uncommon)
                    .with_target("entity"),
                ModifierRecord::new("of_embers", "of Embers", AffixSlot::Suffix, Rarity::Rare)
                    .with_target("weapon"),
            ],
        ));
        registry.load();

        assert_eq!(ids(&registry.prefixes()), vec!["brave"]);
        assert_eq!(ids(&registry.suffixes()), vec!["of_blight", "of_embers"]);
        assert_eq!(ids(&registry.by_slot(AffixSlot::Suffix)), vec!["of_blight", "of_embers"]);
        assert_eq!(ids(&registry.by_rarity(Rarity::Rare)), vec!["of_embers"]);
        assert_eq!(ids(&registry.applicable_to("weapon")), vec!["brave", "of_embers"]);
        assert_eq!(registry.combination_count(), 2 * 3);
    }

    #[test]
    fn entity_queries() {
        let mut imp = EntityTemplate::new("imp", "Imp", EntityKind::Normal);
        imp.immunities.push("poison".into());
        let registry = Registry::new(MemorySource::new(
            "mem",
            vec![
                EntityTemplate::new("hero", "Hero", EntityKind::Player),
                imp,
                EntityTemplate::new("knight", "Fallen Knight", EntityKind::Elite),
                EntityTemplate::new("seraph", "Broken Seraph", EntityKind::Boss),
            ],
        ));
        registry.load();

        assert_eq!(ids(&registry.players()), vec!["hero"]);
        assert_eq!(ids(&registry.enemies()), vec!["imp", "knight", "seraph"]);
        assert_eq!(ids(&registry.bosses()), vec!["seraph"]);
        assert_eq!(ids(&registry.elites()), vec!["knight"]);
        assert_eq!(ids(&registry.by_type(EntityKind::Normal)), vec!["imp"]);
        assert_eq!(ids(&registry.with_immunity("poison")), vec!["imp"]);
    }

    #[test]
    fn buff_queries() {
        let mut ward = BuffDef::new("ward", "Ward", StatBlock::from([("defense", 5)]));
        ward.is_permanent = true;
        ward.normalize();
        let registry = Registry::new(MemorySource::new(
            "mem",
            vec![
                BuffDef::new("rage", "Rage", StatBlock::from([("attack", 3)])),
                ward,
            ],
        ));
        registry.load();

        assert_eq!(ids(&registry.temporary()), vec!["rage"]);
        assert_eq!(ids(&registry.permanent()), vec!["ward"]);
        assert_eq!(ids(&registry.by_type(BuffKind::Permanent)), vec!["ward"]);
        assert_eq!(ids(&registry.modifying_stat("attack")), vec!["rage"]);
    }

    #[test]
    fn ability_and_status_queries() {
        let abilities = Registry::new(MemorySource::new(
            "mem",
            vec![
                AbilityDef::new("shoot", "Shoot", AbilityKind::Attack),
                AbilityDef::new("bandage", "Bandage", AbilityKind::Heal),
            ],
        ));
        abilities.load();
        assert_eq!(ids(&abilities.by_kind(AbilityKind::Heal)), vec!["bandage"]);

        let mut burn = StatusEffectDef::new("burn", "Burn");
        burn.effect_type = "negative".into();
        let statuses = Registry::new(MemorySource::new(
            "mem",
            vec![burn, StatusEffectDef::new("calm", "Calm")],
        ));
        statuses.load();
        assert_eq!(ids(&statuses.by_effect_type("Negative")), vec!["burn"]);
        assert_eq!(ids(&statuses.by_effect_type("neutral")), vec!["calm"]);
    }
}
