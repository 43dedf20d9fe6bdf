//! Scripted walkthrough: load content, roll variants, fight one encounter.
use std::io::Write;

use anyhow::{Context, Result, bail};
use game_content::{ContentFactory, ScanMode};
use game_core::{AbilityKind, BaseSubject, CombatantId, GameError, Outcome, PcgRng, Side, StatBlock};
use runtime::{
    BattleError, BattleSession, ContentContext, ENTITY_TARGET, Signal, SignalRecord,
    initialize_database,
};

use crate::config::{Backend, ClientConfig};

/// Rounds after which the demo fight is called off.
const MAX_ROUNDS: u32 = 30;

/// Hostile combatants drawn into the demo encounter.
const MAX_HOSTILES: usize = 2;

/// Builds the content context for the configured backend and loads it.
pub fn build_context(config: &ClientConfig) -> Result<ContentContext> {
    let factory = ContentFactory::new(&config.data_dir);
    let ctx = match config.backend {
        Backend::Json => ContentContext::from_data_dir(&factory)?,
        Backend::Sqlite => {
            let game_config = factory.load_config()?;
            let scan = ScanMode::from_recursive(game_config.recursive_scan);
            let ctx = ContentContext::from_sqlite(game_config, &config.db_path);
            let migrate_from = config.migrate.then_some((config.data_dir.as_path(), scan));
            if let Some(report) = initialize_database(&config.db_path, migrate_from, ctx.bus())
                .with_context(|| format!("opening {}", config.db_path.display()))?
            {
                tracing::info!(records = report.total(), issues = report.issues.len(), "migrated JSON content");
            }
            ctx
        }
    };

    let report = ctx.load_all();
    if report.total_count() == 0 {
        bail!(
            "no content loaded from {} ({} backend)",
            config.data_dir.display(),
            config.backend
        );
    }
    Ok(ctx)
}

/// Prints registry sizes and any load problems.
pub fn print_inventory(ctx: &ContentContext, out: &mut impl Write) -> Result<()> {
    writeln!(out, "== Content ==")?;
    let rows = [
        (ctx.modifiers().name(), ctx.modifiers().len()),
        (ctx.statuses().name(), ctx.statuses().len()),
        (ctx.buffs().name(), ctx.buffs().len()),
        (ctx.abilities().name(), ctx.abilities().len()),
        (ctx.entities().name(), ctx.entities().len()),
    ];
    for (name, count) in rows {
        writeln!(out, "{name:>16}: {count}")?;
    }
    writeln!(
        out,
        "{:>16}: {}",
        "name combos",
        ctx.modifiers().combination_count()
    )?;

    for record in ctx.bus().history_of(Signal::RegistryError) {
        writeln!(
            out,
            "  ! {} {}: {}",
            record.str_field("registry_name").unwrap_or("?"),
            record.str_field("origin").unwrap_or("?"),
            record.str_field("message").unwrap_or("?"),
        )?;
    }
    Ok(())
}

/// Rolls one variant per enemy template and a sample weapon.
pub fn print_variants(ctx: &ContentContext, rng: &mut PcgRng, out: &mut impl Write) -> Result<()> {
    writeln!(out, "\n== Variants ==")?;
    for template in ctx.entities().enemies() {
        let variant = ctx.variant(&template.as_subject(), ENTITY_TARGET, rng);
        write!(out, "{:<28} {}", variant.final_name, stat_line(&variant.final_stats))?;
        if !variant.granted_effects.is_empty() {
            let effects: Vec<&str> = variant.granted_effects.iter().map(String::as_str).collect();
            write!(out, "  [{}]", effects.join(", "))?;
        }
        writeln!(out)?;
    }

    let revolver = BaseSubject::new("Revolver", StatBlock::from([("attack", 6), ("accuracy", 70)]));
    let weapon = ctx.weapon_variant(&revolver, rng);
    writeln!(out, "{:<28} {}", weapon.final_name, stat_line(&weapon.final_stats))?;
    Ok(())
}

/// Fights the first player template against up to two enemies.
///
/// Party members open with their strongest affordable attack ability and
/// fall back to a basic strike; hostiles always strike.
pub fn run_encounter(ctx: &ContentContext, rng: &mut PcgRng, out: &mut impl Write) -> Result<Outcome> {
    let Some(player) = ctx.entities().players().into_iter().next() else {
        bail!("no player template among {} entities", ctx.entities().len());
    };
    let hostiles: Vec<String> = ctx
        .entities()
        .enemies()
        .iter()
        .filter(|template| !template.is_boss)
        .take(MAX_HOSTILES)
        .map(|template| template.id.clone())
        .collect();
    let hostile_ids: Vec<&str> = hostiles.iter().map(String::as_str).collect();

    let mut attacks = ctx.abilities().by_kind(AbilityKind::Attack);
    attacks.sort_by_key(|ability| std::cmp::Reverse(ability.effects.damage_range().1));

    let mut session = BattleSession::from_registry(
        ctx,
        &[player.id.as_str()],
        &hostile_ids,
        Some(ENTITY_TARGET),
        rng,
    )?;

    writeln!(out, "\n== Encounter ==")?;
    let mut last_seq = ctx.bus().history(1).first().map_or(0, |r| r.seq);
    session.start(rng);
    last_seq = narrate(ctx, &session, last_seq, out)?;

    while !session.is_over() && session.round() <= MAX_ROUNDS {
        let Some(actor) = session.current_actor() else {
            break;
        };
        let side = session.combatant(actor).map(|c| c.side);
        if side == Some(Side::Party) {
            party_turn(&mut session, actor, &attacks, rng)?;
        } else {
            session.basic_turn(rng)?;
        }
        last_seq = narrate(ctx, &session, last_seq, out)?;
    }

    let outcome = session.outcome();
    if outcome == Outcome::Ongoing {
        writeln!(out, "The fight drags past round {MAX_ROUNDS}; everyone withdraws.")?;
    }
    Ok(outcome)
}

fn party_turn(
    session: &mut BattleSession<'_>,
    actor: CombatantId,
    attacks: &[std::sync::Arc<game_core::AbilityDef>],
    rng: &mut PcgRng,
) -> Result<()> {
    let Some(target) = session.first_living(Side::Hostile) else {
        return Ok(());
    };

    let mut acted = false;
    for ability in attacks {
        match session.use_ability(actor, &ability.id, Some(target), rng) {
            Ok(_) => {
                acted = true;
                break;
            }
            Err(err) if is_retryable(&err) => {
                tracing::debug!(ability = %ability.id, code = err.error_code(), "ability skipped");
            }
            Err(err) => return Err(err.into()),
        }
    }
    if !acted {
        session.attack(actor, target)?;
    }
    if !session.is_over() {
        session.end_turn(rng)?;
    }
    Ok(())
}

/// Errors that only rule out this ability for this turn.
fn is_retryable(err: &BattleError) -> bool {
    matches!(
        err,
        BattleError::OnCooldown { .. }
            | BattleError::InvalidTarget { .. }
            | BattleError::Combat(game_core::CombatError::InsufficientResources(_))
    )
}

/// Prints combat signals published after `since`; returns the newest sequence.
fn narrate(
    ctx: &ContentContext,
    session: &BattleSession<'_>,
    since: u64,
    out: &mut impl Write,
) -> Result<u64> {
    let records = ctx.bus().history(ctx.bus().history_capacity());
    let mut newest = since;
    for record in records.iter().filter(|r| r.seq > since) {
        newest = record.seq;
        if let Some(line) = describe(session, record) {
            writeln!(out, "{line}")?;
        }
    }
    Ok(newest)
}

fn describe(session: &BattleSession<'_>, record: &SignalRecord) -> Option<String> {
    let name = |key: &str| {
        record
            .int_field(key)
            .and_then(|id| u32::try_from(id).ok())
            .and_then(|id| session.combatant(CombatantId(id)))
            .map_or_else(|| "someone".to_owned(), |c| c.name.clone())
    };

    let line = match record.signal {
        Signal::CombatStarted => format!("Combat begins ({} turn order).", session.encounter().order().len()),
        Signal::TurnStarted => format!(
            "-- round {}: {} acts",
            record.int_field("round").unwrap_or_default(),
            name("combatant")
        ),
        Signal::AbilityUsed => {
            let mut line = format!(
                "{} uses {} on {}",
                name("user"),
                record.str_field("ability").unwrap_or("?"),
                name("target")
            );
            if record.payload.get("critical").and_then(|v| v.as_bool()) == Some(true) {
                line.push_str(" (critical)");
            }
            line
        }
        Signal::EntityHpChanged => format!(
            "   {} {:+} hp ({}/{})",
            name("combatant"),
            record.int_field("delta").unwrap_or_default(),
            record.int_field("health").unwrap_or_default(),
            record.int_field("max_health").unwrap_or_default(),
        ),
        Signal::StatusApplied => format!(
            "   {} is afflicted with {}",
            name("combatant"),
            record.str_field("name").unwrap_or("?")
        ),
        Signal::StatusRemoved => format!(
            "   {} loses {} ({})",
            name("combatant"),
            record.str_field("status").unwrap_or("?"),
            record.str_field("reason").unwrap_or("?")
        ),
        Signal::EntityDied => format!("   {} falls.", name("combatant")),
        Signal::CombatEnded => format!(
            "Combat over: {} after {} round(s).",
            record.str_field("outcome").unwrap_or("?"),
            record.int_field("rounds").unwrap_or_default()
        ),
        _ => return None,
    };
    Some(line)
}

fn stat_line(stats: &StatBlock) -> String {
    stats
        .iter()
        .map(|(stat, value)| format!("{stat}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn seed(root: &Path) {
        write(
            root,
            "entities/core.json",
            r#"[{"id": "detective", "name": "Detective", "description": "", "entity_type": "player",
                 "base_attack": 25, "base_speed": 30},
                {"id": "rat", "name": "Rat", "description": "", "entity_type": "normal",
                 "base_health": 20, "base_attack": 3, "base_defense": 0, "base_speed": 5}]"#,
        );
        write(
            root,
            "modifiers/core.json",
            r#"[{"id": "rabid", "name": "Rabid", "type": "prefix", "stat_modifiers": {"attack": 1}}]"#,
        );
    }

    fn config(root: &Path) -> ClientConfig {
        ClientConfig {
            data_dir: root.to_path_buf(),
            db_path: root.join("content.db"),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn json_demo_runs_to_victory() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let ctx = build_context(&config(dir.path())).unwrap();

        let mut out = Vec::new();
        let mut rng = PcgRng::new(8);
        print_inventory(&ctx, &mut out).unwrap();
        print_variants(&ctx, &mut rng, &mut out).unwrap();
        let outcome = run_encounter(&ctx, &mut rng, &mut out).unwrap();

        assert_eq!(outcome, Outcome::Victory);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Combat over: victory"));
        assert!(text.contains("falls."));
    }

    #[test]
    fn sqlite_backend_migrates_then_loads() {
        let dir = TempDir::new().unwrap();
        seed(dir.path());
        let mut config = config(dir.path());
        config.backend = Backend::Sqlite;
        config.migrate = true;

        let ctx = build_context(&config).unwrap();
        assert_eq!(ctx.entities().len(), 2);
        assert_eq!(ctx.bus().history_of(Signal::DatabaseInitialized).len(), 1);
    }

    #[test]
    fn empty_data_dir_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(build_context(&config(dir.path())).is_err());
    }
}
