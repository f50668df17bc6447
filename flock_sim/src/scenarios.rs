//! Built-in flocking scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Two drones three units apart push each other away
    SeparationPair,

    /// A lone drone accelerates toward a fixed target up to its speed cap
    TargetSeek,

    /// Two drones in neighbouring cells but out of range see nobody
    GridFilter,

    /// A hundred drones with only cohesion contract around their centroid
    CohesionContract,

    /// A predator chases prey through a full five-rule flock
    PredatorChase,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SeparationPair,
            ScenarioId::TargetSeek,
            ScenarioId::GridFilter,
            ScenarioId::CohesionContract,
            ScenarioId::PredatorChase,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SeparationPair => "separation_pair",
            ScenarioId::TargetSeek => "target_seek",
            ScenarioId::GridFilter => "grid_filter",
            ScenarioId::CohesionContract => "cohesion_contract",
            ScenarioId::PredatorChase => "predator_chase",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SeparationPair => "2 drones 3 apart, separation range 5: both move away",
            ScenarioId::TargetSeek => "1 drone seeks (10,0): accel 100, cap 10, never over the cap",
            ScenarioId::GridFilter => "cell 15, drones 20 apart, range 10: empty neighbour lists",
            ScenarioId::CohesionContract => "100 drones, cohesion only: spread shrinks, centroid holds",
            ScenarioId::PredatorChase => "predator hunts a flock that coheres, aligns and flees",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "separation_pair" | "separation" => Ok(ScenarioId::SeparationPair),
            "target_seek" | "target" => Ok(ScenarioId::TargetSeek),
            "grid_filter" | "grid" => Ok(ScenarioId::GridFilter),
            "cohesion_contract" | "cohesion" => Ok(ScenarioId::CohesionContract),
            "predator_chase" | "predator" | "demo" => Ok(ScenarioId::PredatorChase),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_names_parse_back() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
            assert!(!scenario.description().is_empty());
        }
    }

    #[test]
    fn test_scenario_aliases() {
        assert_eq!("DEMO".parse::<ScenarioId>(), Ok(ScenarioId::PredatorChase));
        assert_eq!("grid".parse::<ScenarioId>(), Ok(ScenarioId::GridFilter));
        assert!("nope".parse::<ScenarioId>().is_err());
    }
}
