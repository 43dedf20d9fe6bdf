//! Explicit content context: every registry, the bus, and the generator.

#[cfg(feature = "sqlite")]
use std::path::Path;

use rand::Rng;

use game_content::{ContentFactory, ContentSource, LoadResult, ScanMode};
use game_core::{
    AbilityDef, BaseSubject, BuffDef, EntityTemplate, GameConfig, GeneratedVariant,
    ModifierRecord, StatusEffectDef, VariantConfig, VariantGenerator,
};

use crate::events::SignalBus;
use crate::registry::{LoadReport, Registry};

/// Target kind used for entity variants.
pub const ENTITY_TARGET: &str = "entity";
/// Target kind used for weapon variants.
pub const WEAPON_TARGET: &str = "weapon";

/// One source per registry.
pub struct ContentSources {
    pub modifiers: Box<dyn ContentSource<ModifierRecord>>,
    pub statuses: Box<dyn ContentSource<StatusEffectDef>>,
    pub buffs: Box<dyn ContentSource<BuffDef>>,
    pub abilities: Box<dyn ContentSource<AbilityDef>>,
    pub entities: Box<dyn ContentSource<EntityTemplate>>,
}

impl ContentSources {
    /// JSON directories under the factory's data directory.
    pub fn json(factory: &ContentFactory, scan: ScanMode) -> Self {
        Self {
            modifiers: Box::new(factory.json_source::<ModifierRecord>(scan)),
            statuses: Box::new(factory.json_source::<StatusEffectDef>(scan)),
            buffs: Box::new(factory.json_source::<BuffDef>(scan)),
            abilities: Box::new(factory.json_source::<AbilityDef>(scan)),
            entities: Box::new(factory.json_source::<EntityTemplate>(scan)),
        }
    }

    /// Tables of one content database.
    #[cfg(feature = "sqlite")]
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        use game_content::SqliteSource;

        let path = path.as_ref();
        Self {
            modifiers: Box::new(SqliteSource::<ModifierRecord>::new(path)),
            statuses: Box::new(SqliteSource::<StatusEffectDef>::new(path)),
            buffs: Box::new(SqliteSource::<BuffDef>::new(path)),
            abilities: Box::new(SqliteSource::<AbilityDef>::new(path)),
            entities: Box::new(SqliteSource::<EntityTemplate>::new(path)),
        }
    }
}

/// Per-registry reports from [`ContentContext::load_all`].
#[derive(Clone, Debug, Default)]
pub struct ContextReport {
    pub registries: Vec<(&'static str, LoadReport)>,
}

impl ContextReport {
    pub fn get(&self, name: &str) -> Option<&LoadReport> {
        self.registries
            .iter()
            .find(|(registry, _)| *registry == name)
            .map(|(_, report)| report)
    }

    pub fn total_count(&self) -> usize {
        self.registries.iter().map(|(_, r)| r.count).sum()
    }

    pub fn error_count(&self) -> usize {
        self.registries.iter().map(|(_, r)| r.errors.len()).sum()
    }
}

/// Everything content-driven code needs, passed explicitly instead of
/// reached through globals.
pub struct ContentContext {
    config: GameConfig,
    bus: SignalBus,
    generator: VariantGenerator,
    modifiers: Registry<ModifierRecord>,
    statuses: Registry<StatusEffectDef>,
    buffs: Registry<BuffDef>,
    abilities: Registry<AbilityDef>,
    entities: Registry<EntityTemplate>,
}

impl ContentContext {
    /// Builds an unloaded context. Call [`ContentContext::load_all`] next.
    pub fn new(config: GameConfig, sources: ContentSources) -> Self {
        let bus = SignalBus::with_history(config.signal_history);
        let generator = VariantGenerator::from_config(&config);
        Self {
            modifiers: Registry::from_boxed(sources.modifiers).with_signals(bus.clone()),
            statuses: Registry::from_boxed(sources.statuses).with_signals(bus.clone()),
            buffs: Registry::from_boxed(sources.buffs).with_signals(bus.clone()),
            abilities: Registry::from_boxed(sources.abilities).with_signals(bus.clone()),
            entities: Registry::from_boxed(sources.entities).with_signals(bus.clone()),
            config,
            bus,
            generator,
        }
    }

    /// Reads `config.toml` from the data directory and points every registry
    /// at its JSON sub-directory.
    pub fn from_data_dir(factory: &ContentFactory) -> LoadResult<Self> {
        let config = factory.load_config()?;
        let scan = ScanMode::from_recursive(config.recursive_scan);
        Ok(Self::new(config, ContentSources::json(factory, scan)))
    }

    #[cfg(feature = "sqlite")]
    pub fn from_sqlite(config: GameConfig, db_path: impl AsRef<Path>) -> Self {
        Self::new(config, ContentSources::sqlite(db_path))
    }

    pub fn load_all(&self) -> ContextReport {
        let report = ContextReport {
            registries: vec![
                (self.modifiers.name(), self.modifiers.load()),
                (self.statuses.name(), self.statuses.load()),
                (self.buffs.name(), self.buffs.load()),
                (self.abilities.name(), self.abilities.load()),
                (self.entities.name(), self.entities.load()),
            ],
        };
        tracing::info!(
            records = report.total_count(),
            errors = report.error_count(),
            "content loaded"
        );
        report
    }

    pub fn reload_all(&self) -> ContextReport {
        let report = ContextReport {
            registries: vec![
                (self.modifiers.name(), self.modifiers.reload()),
                (self.statuses.name(), self.statuses.reload()),
                (self.buffs.name(), self.buffs.reload()),
                (self.abilities.name(), self.abilities.reload()),
                (self.entities.name(), self.entities.reload()),
            ],
        };
        tracing::info!(
            records = report.total_count(),
            errors = report.error_count(),
            "content reloaded"
        );
        report
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn generator(&self) -> &VariantGenerator {
        &self.generator
    }

    pub fn modifiers(&self) -> &Registry<ModifierRecord> {
        &self.modifiers
    }

    pub fn statuses(&self) -> &Registry<StatusEffectDef> {
        &self.statuses
    }

    pub fn buffs(&self) -> &Registry<BuffDef> {
        &self.buffs
    }

    pub fn abilities(&self) -> &Registry<AbilityDef> {
        &self.abilities
    }

    pub fn entities(&self) -> &Registry<EntityTemplate> {
        &self.entities
    }

    /// Generates a variant of `subject` from the current modifier table.
    pub fn variant<R>(&self, subject: &BaseSubject, target: &str, rng: &mut R) -> GeneratedVariant
    where
        R: Rng + ?Sized,
    {
        let table = self.modifiers.snapshot();
        self.generator.generate(subject, target, table.iter(), rng)
    }

    /// Variant of a registered entity template, or `None` for an unknown id.
    pub fn entity_variant<R>(
        &self,
        entity_id: &str,
        target: &str,
        rng: &mut R,
    ) -> Option<GeneratedVariant>
    where
        R: Rng + ?Sized,
    {
        let template = self.entities.get(entity_id)?;
        Some(self.variant(&template.as_subject(), target, rng))
    }

    /// Weapon variant using the weapon preset (always modified, up to three
    /// per slot).
    pub fn weapon_variant<R>(&self, weapon: &BaseSubject, rng: &mut R) -> GeneratedVariant
    where
        R: Rng + ?Sized,
    {
        let generator = self.generator.with_variant_config(VariantConfig::weapon());
        let table = self.modifiers.snapshot();
        generator.generate(weapon, WEAPON_TARGET, table.iter(), rng)
    }
}

#[cfg(test)]
mod tests {
    use game_content::MemorySource;
    use game_core::{AffixSlot, EntityKind, PcgRng, Rarity, StatBlock};

    use super::*;
    use crate::events::Signal;

    fn sources() -> ContentSources {
        let mut imp = EntityTemplate::new("imp", "Imp", EntityKind::Normal);
        imp.base_attack = 5;
        ContentSources {
            modifiers: Box::new(MemorySource::new(
                "modifiers",
                vec![
                    ModifierRecord::new("brave", "Brave", AffixSlot::Prefix, Rarity::Common)
                        .with_stat("attack", 2),
                    ModifierRecord::new("keen", "Keen", AffixSlot::Prefix, Rarity::Common)
                        .with_target(WEAPON_TARGET),
                ],
            )),
            statuses: Box::new(MemorySource::new("statuses", vec![StatusEffectDef::new("burn", "Burn")])),
            buffs: Box::new(MemorySource::<BuffDef>::new("buffs", Vec::new())),
            abilities: Box::new(MemorySource::<AbilityDef>::new("abilities", Vec::new())),
            entities: Box::new(MemorySource::new("entities", vec![imp])),
        }
    }

    #[test]
    fn load_all_reports_each_registry() {
        let ctx = ContentContext::new(GameConfig::default(), sources());
        let report = ctx.load_all();

        assert_eq!(report.registries.len(), 5);
        assert_eq!(report.get("modifiers").map(|r| r.count), Some(2));
        assert_eq!(report.get("buffs").map(|r| r.count), Some(0));
        assert_eq!(report.total_count(), 4);
        assert_eq!(ctx.bus().history_of(Signal::RegistryInitialized).len(), 5);

        ctx.reload_all();
        assert_eq!(ctx.bus().history_of(Signal::RegistryReloaded).len(), 5);
    }

    #[test]
    fn signal_history_follows_config() {
        let config = GameConfig {
            signal_history: 2,
            ..GameConfig::default()
        };
        let ctx = ContentContext::new(config, sources());
        ctx.load_all();
        assert_eq!(ctx.bus().history_capacity(), 2);
        assert_eq!(ctx.bus().history(10).len(), 2);
    }

    #[test]
    fn entity_variant_uses_template_stats() {
        let mut config = GameConfig::default();
        config.variants.base_chance = 1.0;
        let ctx = ContentContext::new(config, sources());
        ctx.load_all();

        let mut rng = PcgRng::new(7);
        let variant = ctx.entity_variant("imp", ENTITY_TARGET, &mut rng).unwrap();
        assert_eq!(variant.final_name, "Brave Imp");
        assert_eq!(variant.final_stats.get("attack"), 7);

        assert!(ctx.entity_variant("ghost", ENTITY_TARGET, &mut rng).is_none());
    }

    #[test]
    fn weapon_variant_always_applies() {
        let ctx = ContentContext::new(GameConfig::default(), sources());
        ctx.load_all();
        let sword = BaseSubject::new("Sword", StatBlock::from([("attack", 4)]));

        for seed in 0..20 {
            let variant = ctx.weapon_variant(&sword, &mut PcgRng::new(seed));
            assert!(variant.is_modified());
        }
    }
}
