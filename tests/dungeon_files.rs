//! Integration tests for dungeon and config files on disk.

use delve::{
    AbilityScores, Character, CharacterClass, DelveError, DelveResult, Dice, DungeonDefinition,
    GameConfig, GameSession, GenerationConfig, LevelCache, Party, PopulationConfig,
};
use std::fs;
use tempfile::tempdir;

fn party() -> Party {
    let mut party = Party::new();
    party.add_member(Character::new(
        "Scribe",
        CharacterClass::Cleric,
        2,
        AbilityScores::default(),
    ));
    party
}

#[test]
fn test_exported_levels_reload_identically() -> DelveResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("dungeon.json");

    let mut cache = LevelCache::new(GenerationConfig::new(31), PopulationConfig::default());
    let mut dice = Dice::seeded(31);
    let mut definitions = Vec::new();
    for number in 1..=2 {
        definitions.push(cache.get_or_create(number, &mut dice)?.to_definition());
    }
    DungeonDefinition::new(definitions.clone()).save(&path)?;

    let loaded = DungeonDefinition::load(&path)?;
    assert_eq!(loaded.num_levels, 2);
    assert_eq!(loaded.levels, definitions);

    let rebuilt = loaded.build_levels(&mut Dice::seeded(0))?;
    for (level, definition) in rebuilt.iter().zip(&definitions) {
        assert_eq!(&level.to_definition(), definition);
    }
    Ok(())
}

#[test]
fn test_session_from_dungeon_file() -> DelveResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("crypt.json");
    fs::write(
        &path,
        r########"{
            "num_levels": 1,
            "levels": [{
                "width": 7,
                "height": 3,
                "tiles": ["#######", "#>.$.<#", "#######"],
                "chests": [[3, 1]],
                "monsters": [{
                    "name": "Rat",
                    "hit_dice": "1d4",
                    "armor_class": 10,
                    "attack_bonus": 0,
                    "damage": "1d3",
                    "position": [4, 1],
                    "max_hp": 2
                }]
            }]
        }"########,
    )?;

    let dungeon = DungeonDefinition::load(&path)?;
    let session =
        GameSession::start_with_dungeon(party(), GameConfig::default(), &dungeon, Dice::seeded(8))?;
    let level = session.level().unwrap();
    assert_eq!(session.position(), delve::Position::new(1, 1));
    assert_eq!(level.chests().len(), 1);
    assert_eq!(level.monsters().len(), 1);
    assert_eq!(level.monsters()[0].monster.current_hp, 2);
    Ok(())
}

#[test]
fn test_malformed_dungeon_file_is_rejected() -> DelveResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{"levels": [{"width": 3}]}"#)?;
    assert!(matches!(
        DungeonDefinition::load(&path),
        Err(DelveError::Serde(_))
    ));

    assert!(matches!(
        DungeonDefinition::load(dir.path().join("missing.json")),
        Err(DelveError::Io(_))
    ));
    Ok(())
}

#[test]
fn test_config_file_overrides_defaults() -> DelveResult<()> {
    let dir = tempdir()?;
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "generation": {"seed": 5, "max_rooms": 4},
            "population": {"chest_spawn_chance": 1.0},
            "session": {"vision_radius": 2, "flee_success_chance": 0.25}
        }"#,
    )?;

    let config = GameConfig::load(&path)?;
    assert_eq!(config.generation.seed, 5);
    assert_eq!(config.generation.max_rooms, 4);
    assert_eq!(config.generation.width, 80);
    assert_eq!(config.population.chest_spawn_chance, 1.0);
    assert_eq!(config.session.vision_radius, 2);
    assert_eq!(config.session.flee_success_chance, 0.25);
    assert_eq!(config.session.experience_per_monster, 100);

    fs::write(&path, r#"{"generation": {"min_room_size": 9, "max_room_size": 4}}"#)?;
    assert!(matches!(
        GameConfig::load(&path),
        Err(DelveError::InvalidConfig(_))
    ));
    Ok(())
}
