//! Piece kinds, attribute tables and the upgrade catalogue.
//!
//! A [`RuleSet`] is the typed form of the rules config: one
//! [`PieceAttributes`] per [`PieceKind`] plus every [`UpgradeDef`]. The
//! built-in rules come from [`RuleSet::base`]; a JSON rules file with the same
//! shape can replace them through [`RuleSet::from_json`], which validates the
//! whole table up front so lookups never fail during play.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::MovementType;

/// Every kind of piece, units and buildings alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PieceKind {
    /// Headquarters: produces resources, trains builders and troopers.
    Base,
    /// Trains advanced units.
    Barracks,
    /// Sits on a mined deposit and produces resources.
    Mine,
    /// Static ranged defence.
    Tower,
    /// Constructs buildings and terraforms.
    Builder,
    /// Basic melee infantry.
    Trooper,
    /// Ranged infantry.
    Archer,
    /// Long range siege engine with splash damage.
    Catapult,
    /// Heals adjacent allies.
    Medic,
    /// Fast flyer that raids enemy buildings.
    Scout,
}

impl PieceKind {
    /// All piece kinds, in table order.
    pub const ALL: [PieceKind; 10] = [
        PieceKind::Base,
        PieceKind::Barracks,
        PieceKind::Mine,
        PieceKind::Tower,
        PieceKind::Builder,
        PieceKind::Trooper,
        PieceKind::Archer,
        PieceKind::Catapult,
        PieceKind::Medic,
        PieceKind::Scout,
    ];

    /// Position of this kind in [`PieceKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Name used in save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "BASE",
            Self::Barracks => "BARRACKS",
            Self::Mine => "MINE",
            Self::Tower => "TOWER",
            Self::Builder => "BUILDER",
            Self::Trooper => "TROOPER",
            Self::Archer => "ARCHER",
            Self::Catapult => "CATAPULT",
            Self::Medic => "MEDIC",
            Self::Scout => "SCOUT",
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PieceKind {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RulesError::UnknownName(s.to_string()))
    }
}

/// Broad combat class used by attack multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Archetype {
    /// Buildings.
    Structure,
    /// Builders.
    Worker,
    /// Melee foot soldiers.
    Infantry,
    /// Ranged foot soldiers.
    Ranged,
    /// Siege engines.
    Siege,
    /// Healers.
    Support,
    /// Flyers.
    Aerial,
}

/// What kind of damage a piece deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DamageType {
    /// Deals no damage.
    None,
    /// Fights pieces sharing its tile.
    Melee,
    /// Fires at distant tiles through ranged attack orders.
    Ranged,
}

/// Special abilities of a piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Specialties {
    /// Ignores target defense entirely.
    pub armor_piercing: bool,
    /// Heals itself by the damage it deals in melee.
    pub lifesteal: bool,
    /// HP restored to adjacent allies by a heal order (0 = not a medic).
    pub heal: u32,
    /// Fraction of direct ranged damage dealt to enemies adjacent to the target.
    pub splash: f64,
    /// May path through tiles held by enemies.
    pub ignores_blocking: bool,
    /// Temporary armor gained when idle during combat.
    pub fortify: u32,
    /// Flat damage dealt to nearby enemies when this piece dies.
    pub death_burst: u32,
    /// Resources stolen from the owner of an enemy structure it damages.
    pub plunder: u32,
    /// May raise or lower adjacent terrain.
    pub terraformer: bool,
}

/// Attributes of one piece kind for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceAttributes {
    /// Combat class.
    pub archetype: Archetype,
    /// Maximum hit points.
    pub max_hp: u32,
    /// Raw attack.
    pub attack: u32,
    /// Innate armor; each point removes a tenth of incoming damage.
    pub armor: u32,
    /// Damage type.
    pub damage_type: DamageType,
    /// Minimum ranged attack distance.
    #[serde(default)]
    pub min_range: u32,
    /// Maximum ranged attack distance.
    #[serde(default)]
    pub max_range: u32,
    /// Movement type.
    pub movement: MovementType,
    /// Tiles moved per turn.
    #[serde(default)]
    pub move_range: u32,
    /// Resource cost to build.
    pub price: u32,
    /// Resources produced at the start of every turn.
    #[serde(default)]
    pub income: u32,
    /// Piece kinds this kind can build.
    #[serde(default)]
    pub buildable: Vec<PieceKind>,
    /// Upgrades this kind can currently purchase.
    #[serde(default)]
    pub upgrades: Vec<UpgradeKind>,
    /// Attack multiplier against an archetype (missing = 1.0).
    #[serde(default)]
    pub multipliers: BTreeMap<Archetype, f64>,
    /// Special abilities.
    #[serde(default)]
    pub flags: Specialties,
}

impl PieceAttributes {
    /// Attack multiplier against `archetype`.
    #[must_use]
    pub fn multiplier(&self, archetype: Archetype) -> f64 {
        self.multipliers.get(&archetype).copied().unwrap_or(1.0)
    }

    /// Whether pieces of this kind can ever move.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.movement != MovementType::Immobile && self.move_range > 0
    }

    /// Whether this kind is a building.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        self.archetype == Archetype::Structure
    }

    /// Validate internal consistency.
    fn validate(&self, kind: PieceKind) -> Result<(), RulesError> {
        let invalid = |reason: &str| {
            Err(RulesError::InvalidAttribute {
                kind,
                reason: reason.to_string(),
            })
        };

        if self.max_hp == 0 {
            return invalid("max_hp must be positive");
        }
        if self.min_range > self.max_range {
            return invalid("min_range exceeds max_range");
        }
        if self.damage_type == DamageType::Ranged && self.max_range == 0 {
            return invalid("ranged pieces need a positive max_range");
        }
        if !(self.flags.splash >= 0.0 && self.flags.splash.is_finite()) {
            return invalid("splash must be a non-negative number");
        }
        if self.multipliers.values().any(|m| !(*m >= 0.0 && m.is_finite())) {
            return invalid("multipliers must be non-negative numbers");
        }
        if self.movement == MovementType::Immobile && self.move_range > 0 {
            return invalid("immobile pieces cannot have a move_range");
        }
        Ok(())
    }
}

/// One attribute table per team: attributes for every piece kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<PieceKind, PieceAttributes>",
    into = "BTreeMap<PieceKind, PieceAttributes>"
)]
pub struct AttributeTable {
    /// Indexed by [`PieceKind::index`]; always holds every kind.
    entries: Vec<PieceAttributes>,
}

impl AttributeTable {
    /// Attributes of `kind`.
    #[must_use]
    pub fn get(&self, kind: PieceKind) -> &PieceAttributes {
        &self.entries[kind.index()]
    }

    /// Mutable attributes of `kind`.
    #[must_use]
    pub fn get_mut(&mut self, kind: PieceKind) -> &mut PieceAttributes {
        &mut self.entries[kind.index()]
    }

    /// Iterate kinds with their attributes.
    pub fn iter(&self) -> impl Iterator<Item = (PieceKind, &PieceAttributes)> {
        PieceKind::ALL.into_iter().zip(self.entries.iter())
    }
}

impl TryFrom<BTreeMap<PieceKind, PieceAttributes>> for AttributeTable {
    type Error = RulesError;

    fn try_from(mut map: BTreeMap<PieceKind, PieceAttributes>) -> Result<Self, Self::Error> {
        let mut entries = Vec::with_capacity(PieceKind::ALL.len());
        for kind in PieceKind::ALL {
            let attrs = map.remove(&kind).ok_or(RulesError::MissingKind(kind))?;
            attrs.validate(kind)?;
            entries.push(attrs);
        }
        Ok(Self { entries })
    }
}

impl From<AttributeTable> for BTreeMap<PieceKind, PieceAttributes> {
    fn from(table: AttributeTable) -> Self {
        PieceKind::ALL.into_iter().zip(table.entries).collect()
    }
}

/// Every purchasable upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeKind {
    /// Trooper attack +1.
    Forging,
    /// Trooper armor +2 (requires forging).
    Plating,
    /// Barracks may build catapults.
    Siegecraft,
    /// Barracks may build scouts (requires siegecraft).
    Aviation,
    /// Tower max HP +5.
    Masonry,
    /// Archer range +1.
    Fletching,
    /// Archers pierce armor (requires fletching).
    Piercing,
    /// Archers deal double damage to flyers.
    Skyward,
    /// Barracks may build medics.
    Triage,
    /// Troopers gain lifesteal.
    Zeal,
}

impl UpgradeKind {
    /// All upgrades.
    pub const ALL: [UpgradeKind; 10] = [
        UpgradeKind::Forging,
        UpgradeKind::Plating,
        UpgradeKind::Siegecraft,
        UpgradeKind::Aviation,
        UpgradeKind::Masonry,
        UpgradeKind::Fletching,
        UpgradeKind::Piercing,
        UpgradeKind::Skyward,
        UpgradeKind::Triage,
        UpgradeKind::Zeal,
    ];

    /// Name used in save files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Forging => "FORGING",
            Self::Plating => "PLATING",
            Self::Siegecraft => "SIEGECRAFT",
            Self::Aviation => "AVIATION",
            Self::Masonry => "MASONRY",
            Self::Fletching => "FLETCHING",
            Self::Piercing => "PIERCING",
            Self::Skyward => "SKYWARD",
            Self::Triage => "TRIAGE",
            Self::Zeal => "ZEAL",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpgradeKind {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| RulesError::UnknownName(s.to_string()))
    }
}

/// A numeric stat an upgrade can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stat {
    /// Maximum hit points (existing pieces are healed by the same amount).
    MaxHp,
    /// Raw attack.
    Attack,
    /// Innate armor.
    Armor,
    /// Tiles moved per turn.
    MoveRange,
    /// Maximum ranged attack distance.
    MaxRange,
}

/// An attribute an upgrade overwrites outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributeValue {
    /// Set armor piercing.
    ArmorPiercing(bool),
    /// Set lifesteal.
    Lifesteal(bool),
    /// Set the splash multiplier.
    Splash(f64),
    /// Set the movement type.
    Movement(MovementType),
}

/// What purchasing an upgrade does to the team's attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    /// Add a flat bonus to a stat.
    StatBonus {
        /// Affected piece kind.
        kind: PieceKind,
        /// Stat raised.
        stat: Stat,
        /// Bonus amount.
        amount: u32,
    },
    /// Overwrite an attribute.
    SetAttribute {
        /// Affected piece kind.
        kind: PieceKind,
        /// New value.
        value: AttributeValue,
    },
    /// Overwrite the attack multiplier against one archetype.
    SetMultiplier {
        /// Affected piece kind.
        kind: PieceKind,
        /// Archetype targeted.
        against: Archetype,
        /// New multiplier.
        value: f64,
    },
    /// Let a piece kind build a new kind.
    UnlockBuild {
        /// Kind whose buildable list grows.
        builder: PieceKind,
        /// Kind added to the list.
        unlocks: PieceKind,
    },
}

/// Catalogue entry for one upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    /// The upgrade.
    pub kind: UpgradeKind,
    /// Resource cost.
    pub price: u32,
    /// Upgrades that must be owned first.
    #[serde(default)]
    pub requires: Vec<UpgradeKind>,
    /// Effect on purchase.
    pub effect: Effect,
}

/// The complete rules: base attribute table and upgrade catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Attributes every team starts from.
    pub attributes: AttributeTable,
    /// Upgrade catalogue.
    pub upgrades: Vec<UpgradeDef>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::base()
    }
}

impl RuleSet {
    /// The built-in rules.
    #[must_use]
    pub fn base() -> Self {
        Self {
            attributes: base_attributes(),
            upgrades: base_upgrades(),
        }
    }

    /// Parse and validate a JSON rules file.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a piece kind is missing,
    /// attributes are inconsistent, or an upgrade is referenced without a definition.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: Self =
            serde_json::from_str(json).map_err(|e| RulesError::Json(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Catalogue entry for `kind`.
    #[must_use]
    pub fn upgrade(&self, kind: UpgradeKind) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|def| def.kind == kind)
    }

    /// Price of `kind`, or `None` if the catalogue lacks it.
    #[must_use]
    pub fn upgrade_price(&self, kind: UpgradeKind) -> Option<u32> {
        self.upgrade(kind).map(|def| def.price)
    }

    /// Check that every referenced upgrade is defined exactly once.
    fn validate(&self) -> Result<(), RulesError> {
        for (i, def) in self.upgrades.iter().enumerate() {
            if self.upgrades[..i].iter().any(|other| other.kind == def.kind) {
                return Err(RulesError::DuplicateUpgrade(def.kind));
            }
        }
        let referenced = self
            .attributes
            .iter()
            .flat_map(|(_, attrs)| attrs.upgrades.iter())
            .chain(self.upgrades.iter().flat_map(|def| def.requires.iter()));
        for upgrade in referenced {
            if self.upgrade(*upgrade).is_none() {
                return Err(RulesError::UndefinedUpgrade(*upgrade));
            }
        }
        Ok(())
    }
}

/// Error raised while loading or looking up rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// The rules JSON did not parse.
    Json(String),
    /// A piece kind has no attribute entry.
    MissingKind(PieceKind),
    /// Attributes of a kind are inconsistent.
    InvalidAttribute {
        /// Offending kind.
        kind: PieceKind,
        /// What is wrong.
        reason: String,
    },
    /// An upgrade is listed somewhere but never defined.
    UndefinedUpgrade(UpgradeKind),
    /// An upgrade is defined twice.
    DuplicateUpgrade(UpgradeKind),
    /// A piece or upgrade name was not recognised.
    UnknownName(String),
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed rules file: {e}"),
            Self::MissingKind(kind) => write!(f, "no attributes for piece kind {kind}"),
            Self::InvalidAttribute { kind, reason } => {
                write!(f, "invalid attributes for {kind}: {reason}")
            }
            Self::UndefinedUpgrade(kind) => write!(f, "upgrade {kind} is referenced but not defined"),
            Self::DuplicateUpgrade(kind) => write!(f, "upgrade {kind} is defined twice"),
            Self::UnknownName(name) => write!(f, "unknown name: {name}"),
        }
    }
}

impl std::error::Error for RulesError {}

fn structure(max_hp: u32, armor: u32, price: u32) -> PieceAttributes {
    PieceAttributes {
        archetype: Archetype::Structure,
        max_hp,
        attack: 0,
        armor,
        damage_type: DamageType::None,
        min_range: 0,
        max_range: 0,
        movement: MovementType::Immobile,
        move_range: 0,
        price,
        income: 0,
        buildable: Vec::new(),
        upgrades: Vec::new(),
        multipliers: BTreeMap::new(),
        flags: Specialties::default(),
    }
}

fn unit(archetype: Archetype, max_hp: u32, attack: u32, damage_type: DamageType) -> PieceAttributes {
    PieceAttributes {
        archetype,
        max_hp,
        attack,
        armor: 0,
        damage_type,
        min_range: 0,
        max_range: 0,
        movement: MovementType::Ground,
        move_range: 2,
        price: 3,
        income: 0,
        buildable: Vec::new(),
        upgrades: Vec::new(),
        multipliers: BTreeMap::new(),
        flags: Specialties::default(),
    }
}

fn base_attributes() -> AttributeTable {
    use PieceKind as K;

    let mut base = structure(20, 4, 20);
    base.income = 3;
    base.buildable = vec![K::Builder, K::Trooper];
    base.upgrades = vec![UpgradeKind::Forging, UpgradeKind::Siegecraft, UpgradeKind::Masonry];

    let mut barracks = structure(12, 3, 8);
    barracks.buildable = vec![K::Trooper, K::Archer];
    barracks.upgrades = vec![
        UpgradeKind::Fletching,
        UpgradeKind::Skyward,
        UpgradeKind::Triage,
        UpgradeKind::Zeal,
    ];

    let mut mine = structure(6, 2, 5);
    mine.income = 2;

    let mut tower = structure(10, 3, 10);
    tower.attack = 2;
    tower.damage_type = DamageType::Ranged;
    tower.min_range = 1;
    tower.max_range = 3;

    let mut builder = unit(Archetype::Worker, 3, 0, DamageType::None);
    builder.buildable = vec![K::Mine, K::Barracks, K::Tower];
    builder.flags.terraformer = true;

    let mut trooper = unit(Archetype::Infantry, 5, 2, DamageType::Melee);
    trooper.armor = 1;
    trooper.multipliers = BTreeMap::from([(Archetype::Structure, 1.5), (Archetype::Ranged, 1.5)]);
    trooper.flags.fortify = 2;

    let mut archer = unit(Archetype::Ranged, 4, 2, DamageType::Ranged);
    archer.min_range = 2;
    archer.max_range = 3;
    archer.price = 4;

    let mut catapult = unit(Archetype::Siege, 5, 3, DamageType::Ranged);
    catapult.armor = 1;
    catapult.min_range = 2;
    catapult.max_range = 4;
    catapult.move_range = 1;
    catapult.price = 7;
    catapult.multipliers = BTreeMap::from([(Archetype::Structure, 2.0)]);
    catapult.flags.splash = 0.5;
    catapult.flags.death_burst = 2;

    let mut medic = unit(Archetype::Support, 4, 0, DamageType::None);
    medic.price = 4;
    medic.flags.heal = 2;

    let mut scout = unit(Archetype::Aerial, 4, 1, DamageType::Melee);
    scout.movement = MovementType::Flying;
    scout.move_range = 4;
    scout.price = 5;
    scout.multipliers = BTreeMap::from([(Archetype::Structure, 2.0)]);
    scout.flags.ignores_blocking = true;
    scout.flags.plunder = 2;

    AttributeTable {
        entries: vec![
            base, barracks, mine, tower, builder, trooper, archer, catapult, medic, scout,
        ],
    }
}

fn base_upgrades() -> Vec<UpgradeDef> {
    use PieceKind as K;
    use UpgradeKind as U;

    let def = |kind, price, requires: &[UpgradeKind], effect| UpgradeDef {
        kind,
        price,
        requires: requires.to_vec(),
        effect,
    };

    vec![
        def(U::Forging, 6, &[], Effect::StatBonus { kind: K::Trooper, stat: Stat::Attack, amount: 1 }),
        def(U::Plating, 8, &[U::Forging], Effect::StatBonus { kind: K::Trooper, stat: Stat::Armor, amount: 2 }),
        def(U::Siegecraft, 8, &[], Effect::UnlockBuild { builder: K::Barracks, unlocks: K::Catapult }),
        def(U::Aviation, 10, &[U::Siegecraft], Effect::UnlockBuild { builder: K::Barracks, unlocks: K::Scout }),
        def(U::Masonry, 6, &[], Effect::StatBonus { kind: K::Tower, stat: Stat::MaxHp, amount: 5 }),
        def(U::Fletching, 5, &[], Effect::StatBonus { kind: K::Archer, stat: Stat::MaxRange, amount: 1 }),
        def(U::Piercing, 8, &[U::Fletching], Effect::SetAttribute { kind: K::Archer, value: AttributeValue::ArmorPiercing(true) }),
        def(U::Skyward, 4, &[], Effect::SetMultiplier { kind: K::Archer, against: Archetype::Aerial, value: 2.0 }),
        def(U::Triage, 5, &[], Effect::UnlockBuild { builder: K::Barracks, unlocks: K::Medic }),
        def(U::Zeal, 6, &[], Effect::SetAttribute { kind: K::Trooper, value: AttributeValue::Lifesteal(true) }),
    ]
}
