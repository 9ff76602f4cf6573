use ag_riskmetrics::{EngineConfig, MonteCarloConfig};
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub simulation: SimulationConfig,
    pub portfolio: PortfolioConfig,
    pub monte_carlo: MonteCarloConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub days: usize,
    pub symbols: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 252,
            symbols: vec!["AAPL".to_string()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    /// Weights in symbol order; equal weights when absent
    pub weights: Option<Vec<f64>>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.engine.validate()?;
        config.monte_carlo.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
simulation:
  symbols: [AAPL, MSFT]
portfolio:
  weights: [0.6, 0.4]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.days, 252);
        assert_eq!(config.simulation.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(config.portfolio.weights, Some(vec![0.6, 0.4]));
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.monte_carlo, MonteCarloConfig::default());
    }

    #[test]
    fn test_sample_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.yaml");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.simulation.symbols.len(), 3);
        assert_eq!(config.monte_carlo.horizon_days, 30);
    }
}
