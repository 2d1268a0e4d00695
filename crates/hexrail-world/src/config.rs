//! Map generation parameters and rail cost tables.
//!
//! Both structs deserialise from the `map` and `costs` sections of
//! `hexrail-config.yaml`. Every field has a default, so an empty section
//! yields the standard board.

use std::collections::BTreeMap;

use hexrail_types::TileType;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

// ---------------------------------------------------------------------------
// Map generation
// ---------------------------------------------------------------------------

/// Parameters of terrain generation and city placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Size factor of the landmass.
    #[serde(default = "default_scale")]
    pub scale: u32,

    /// Number of cities to found.
    #[serde(default = "default_cities")]
    pub cities: u32,

    /// How many of those cities are starting cities.
    #[serde(default = "default_starting_cities")]
    pub starting_cities: u32,

    /// Founding probability of an unremarkable plain tile.
    #[serde(default = "default_city_base_probability")]
    pub city_base_probability: f64,

    /// Founding probability on the coast.
    #[serde(default = "default_city_at_coast_probability")]
    pub city_at_coast_probability: f64,

    /// Founding probability near mountains.
    #[serde(default = "default_city_near_mountain_probability")]
    pub city_near_mountain_probability: f64,

    /// Radius searched for mountains.
    #[serde(default = "default_city_near_mountain_radius")]
    pub city_near_mountain_radius: u32,

    /// Founding probability near an existing city.
    #[serde(default = "default_city_near_city_probability")]
    pub city_near_city_probability: f64,

    /// Radius searched for existing cities.
    #[serde(default = "default_city_near_city_radius")]
    pub city_near_city_radius: u32,

    /// Samples drawn before city placement gives up.
    #[serde(default = "default_max_placement_attempts")]
    pub max_placement_attempts: u32,

    /// Maximum length of a generated city name.
    #[serde(default = "default_city_name_length")]
    pub city_name_length: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            cities: default_cities(),
            starting_cities: default_starting_cities(),
            city_base_probability: default_city_base_probability(),
            city_at_coast_probability: default_city_at_coast_probability(),
            city_near_mountain_probability: default_city_near_mountain_probability(),
            city_near_mountain_radius: default_city_near_mountain_radius(),
            city_near_city_probability: default_city_near_city_probability(),
            city_near_city_radius: default_city_near_city_radius(),
            max_placement_attempts: default_max_placement_attempts(),
            city_name_length: default_city_name_length(),
        }
    }
}

const fn default_scale() -> u32 {
    5
}

const fn default_cities() -> u32 {
    10
}

const fn default_starting_cities() -> u32 {
    3
}

const fn default_city_base_probability() -> f64 {
    0.3
}

const fn default_city_at_coast_probability() -> f64 {
    0.1
}

const fn default_city_near_mountain_probability() -> f64 {
    0.05
}

const fn default_city_near_mountain_radius() -> u32 {
    1
}

const fn default_city_near_city_probability() -> f64 {
    0.001
}

const fn default_city_near_city_radius() -> u32 {
    3
}

const fn default_max_placement_attempts() -> u32 {
    1_000_000
}

const fn default_city_name_length() -> usize {
    10
}

// ---------------------------------------------------------------------------
// Cost tables
// ---------------------------------------------------------------------------

/// Unordered pair of terrain types, the key of the building cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerrainPair(TileType, TileType);

impl TerrainPair {
    /// Create the pair; argument order does not matter.
    pub fn new(a: TileType, b: TileType) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Building cost of an edge between two terrain types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingCost {
    /// Terrain at the two ends, in any order.
    pub between: [TileType; 2],
    /// Credits or budget required.
    pub cost: u32,
}

/// Driving cost of a step from one terrain type to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivingCost {
    /// Terrain left.
    pub from: TileType,
    /// Terrain entered.
    pub to: TileType,
    /// Movement points spent.
    pub cost: u32,
}

/// Cost tables and fees of the rail economy.
///
/// Construction checks that every terrain combination has an entry, so
/// the lookups never miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CostTablesSpec", into = "CostTablesSpec")]
pub struct CostTables {
    building: BTreeMap<TerrainPair, u32>,
    driving: BTreeMap<(TileType, TileType), u32>,
    parallel_fee: u32,
    parallel_fee_at_city: u32,
    junction_fee: u32,
    rent_per_owner: u32,
}

/// Serialised form of [`CostTables`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostTablesSpec {
    /// Building cost entries.
    #[serde(default = "default_building_costs")]
    pub building: Vec<BuildingCost>,

    /// Driving cost entries.
    #[serde(default = "default_driving_costs")]
    pub driving: Vec<DrivingCost>,

    /// Fee owed to each owner of an edge built in parallel.
    #[serde(default = "default_parallel_fee")]
    pub parallel_fee: u32,

    /// Parallel fee when either end of the edge is a city.
    #[serde(default = "default_parallel_fee_at_city")]
    pub parallel_fee_at_city: u32,

    /// Fee owed to owners of rails meeting at a non-city junction.
    #[serde(default = "default_junction_fee")]
    pub junction_fee: u32,

    /// Rent owed to each owner of a rented edge.
    #[serde(default = "default_rent_per_owner")]
    pub rent_per_owner: u32,
}

impl Default for CostTablesSpec {
    fn default() -> Self {
        Self {
            building: default_building_costs(),
            driving: default_driving_costs(),
            parallel_fee: default_parallel_fee(),
            parallel_fee_at_city: default_parallel_fee_at_city(),
            junction_fee: default_junction_fee(),
            rent_per_owner: default_rent_per_owner(),
        }
    }
}

fn default_building_costs() -> Vec<BuildingCost> {
    vec![
        BuildingCost {
            between: [TileType::Plain, TileType::Plain],
            cost: 1,
        },
        BuildingCost {
            between: [TileType::Plain, TileType::Mountain],
            cost: 3,
        },
        BuildingCost {
            between: [TileType::Mountain, TileType::Mountain],
            cost: 5,
        },
    ]
}

fn default_driving_costs() -> Vec<DrivingCost> {
    vec![
        DrivingCost {
            from: TileType::Plain,
            to: TileType::Plain,
            cost: 1,
        },
        DrivingCost {
            from: TileType::Plain,
            to: TileType::Mountain,
            cost: 2,
        },
        DrivingCost {
            from: TileType::Mountain,
            to: TileType::Mountain,
            cost: 1,
        },
        DrivingCost {
            from: TileType::Mountain,
            to: TileType::Plain,
            cost: 1,
        },
    ]
}

const fn default_parallel_fee() -> u32 {
    5
}

const fn default_parallel_fee_at_city() -> u32 {
    3
}

const fn default_junction_fee() -> u32 {
    1
}

const fn default_rent_per_owner() -> u32 {
    1
}

impl TryFrom<CostTablesSpec> for CostTables {
    type Error = WorldError;

    fn try_from(spec: CostTablesSpec) -> Result<Self, Self::Error> {
        let tables = Self::from_entries(&spec);
        for a in TileType::ALL {
            for b in TileType::ALL {
                if !tables.building.contains_key(&TerrainPair::new(a, b)) {
                    return Err(WorldError::IncompleteCostTable(format!(
                        "building between {a:?} and {b:?}"
                    )));
                }
                if !tables.driving.contains_key(&(a, b)) {
                    return Err(WorldError::IncompleteCostTable(format!(
                        "driving from {a:?} to {b:?}"
                    )));
                }
            }
        }
        Ok(tables)
    }
}

impl From<CostTables> for CostTablesSpec {
    fn from(tables: CostTables) -> Self {
        Self {
            building: tables
                .building
                .iter()
                .map(|(pair, &cost)| BuildingCost {
                    between: [pair.0, pair.1],
                    cost,
                })
                .collect(),
            driving: tables
                .driving
                .iter()
                .map(|(&(from, to), &cost)| DrivingCost { from, to, cost })
                .collect(),
            parallel_fee: tables.parallel_fee,
            parallel_fee_at_city: tables.parallel_fee_at_city,
            junction_fee: tables.junction_fee,
            rent_per_owner: tables.rent_per_owner,
        }
    }
}

impl Default for CostTables {
    fn default() -> Self {
        Self::from_entries(&CostTablesSpec::default())
    }
}

impl CostTables {
    fn from_entries(spec: &CostTablesSpec) -> Self {
        Self {
            building: spec
                .building
                .iter()
                .map(|entry| {
                    let [a, b] = entry.between;
                    (TerrainPair::new(a, b), entry.cost)
                })
                .collect(),
            driving: spec
                .driving
                .iter()
                .map(|entry| ((entry.from, entry.to), entry.cost))
                .collect(),
            parallel_fee: spec.parallel_fee,
            parallel_fee_at_city: spec.parallel_fee_at_city,
            junction_fee: spec.junction_fee,
            rent_per_owner: spec.rent_per_owner,
        }
    }

    /// Building cost between two terrain types, in either order.
    pub fn building_cost(&self, a: TileType, b: TileType) -> u32 {
        // Complete by construction; the fallback is unreachable.
        self.building
            .get(&TerrainPair::new(a, b))
            .copied()
            .unwrap_or(u32::MAX)
    }

    /// Driving cost of a step from `from` onto `to`.
    pub fn driving_cost(&self, from: TileType, to: TileType) -> u32 {
        self.driving.get(&(from, to)).copied().unwrap_or(u32::MAX)
    }

    /// Fee per owner for building in parallel away from cities.
    pub const fn parallel_fee(&self) -> u32 {
        self.parallel_fee
    }

    /// Fee per owner for building in parallel next to a city.
    pub const fn parallel_fee_at_city(&self) -> u32 {
        self.parallel_fee_at_city
    }

    /// Fee per owner of rails meeting at a non-city junction.
    pub const fn junction_fee(&self) -> u32 {
        self.junction_fee
    }

    /// Rent per owner of a rented edge.
    pub const fn rent_per_owner(&self) -> u32 {
        self.rent_per_owner
    }
}
