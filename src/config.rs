//! TOML configuration loading and validation.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock simulation: bids 900..1000, asks 1050..1150, tick 25.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::snapshot::DEFAULT_DEPTH;
use crate::Price;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub errors: ErrorConfig,
    #[serde(default)]
    pub processor: ProcessorConfig,
}

/// Shape of the simulated market.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_start_price")]
    pub start_price: Price,
    #[serde(default = "default_tick_size")]
    pub tick_size: Price,
    /// Levels kept on each side after a price move settles
    #[serde(default = "default_num_levels")]
    pub num_levels: usize,
    /// Ids handed out start one above this
    #[serde(default = "default_start_order_id")]
    pub start_order_id: u64,
    #[serde(default = "default_max_orders_per_level")]
    pub max_orders_per_level: usize,
    #[serde(default = "default_max_order_quantity")]
    pub max_order_quantity: u64,
    /// How far (in ticks) the mid may drift before moves in that direction
    /// stop, and the most levels a single gap fill adds
    #[serde(default = "default_tick_margin")]
    pub tick_margin: u32,
}

fn default_start_price() -> Price {
    Price::from(900)
}
fn default_tick_size() -> Price {
    Price::from(25)
}
fn default_num_levels() -> usize {
    5
}
fn default_start_order_id() -> u64 {
    1_000_000
}
fn default_max_orders_per_level() -> usize {
    10
}
fn default_max_order_quantity() -> u64 {
    10
}
fn default_tick_margin() -> u32 {
    8
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start_price: default_start_price(),
            tick_size: default_tick_size(),
            num_levels: default_num_levels(),
            start_order_id: default_start_order_id(),
            max_orders_per_level: default_max_orders_per_level(),
            max_order_quantity: default_max_order_quantity(),
            tick_margin: default_tick_margin(),
        }
    }
}

/// Selection strategy and its weights.
#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_strategy_name")]
    pub name: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub event_weights: EventWeights,
    /// Weight of moving 1, 2, 3, ... ticks
    #[serde(default = "default_tick_move_weights")]
    pub tick_move_weights: Vec<u32>,
}

fn default_strategy_name() -> String {
    "random".into()
}
fn default_seed() -> u64 {
    113
}
fn default_tick_move_weights() -> Vec<u32> {
    vec![6, 3, 1]
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: default_strategy_name(),
            seed: default_seed(),
            event_weights: EventWeights::default(),
            tick_move_weights: default_tick_move_weights(),
        }
    }
}

impl StrategyConfig {
    /// Largest number of ticks a single price move can take.
    pub fn max_tick_move(&self) -> usize {
        self.tick_move_weights.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EventWeights {
    #[serde(default = "default_add_weight")]
    pub add: u32,
    #[serde(default = "default_modify_weight")]
    pub modify: u32,
    #[serde(default = "default_cancel_weight")]
    pub cancel: u32,
    #[serde(default = "default_price_move_weight")]
    pub price_move: u32,
}

fn default_add_weight() -> u32 {
    10
}
fn default_modify_weight() -> u32 {
    79
}
fn default_cancel_weight() -> u32 {
    10
}
fn default_price_move_weight() -> u32 {
    1
}

impl Default for EventWeights {
    fn default() -> Self {
        Self {
            add: default_add_weight(),
            modify: default_modify_weight(),
            cancel: default_cancel_weight(),
            price_move: default_price_move_weight(),
        }
    }
}

impl EventWeights {
    pub fn total(&self) -> u64 {
        [self.add, self.modify, self.cancel, self.price_move]
            .iter()
            .map(|&w| u64::from(w))
            .sum()
    }
}

/// Malformed-event injection. Each `*_one_in` is the denominator of that
/// error's per-opportunity probability.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_injector_name")]
    pub injector: String,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_rare_one_in")]
    pub duplicate_id_one_in: u32,
    #[serde(default = "default_rare_one_in")]
    pub bad_cancel_one_in: u32,
    #[serde(default = "default_field_one_in")]
    pub field_error_one_in: u32,
    #[serde(default = "default_bogus_one_in")]
    pub bogus_add_one_in: u32,
    #[serde(default = "default_bogus_one_in")]
    pub bogus_trade_one_in: u32,
}

fn default_injector_name() -> String {
    "random".into()
}
fn default_rare_one_in() -> u32 {
    1000
}
fn default_field_one_in() -> u32 {
    5000
}
fn default_bogus_one_in() -> u32 {
    500
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            injector: default_injector_name(),
            seed: default_seed(),
            duplicate_id_one_in: default_rare_one_in(),
            bad_cancel_one_in: default_rare_one_in(),
            field_error_one_in: default_field_one_in(),
            bogus_add_one_in: default_bogus_one_in(),
            bogus_trade_one_in: default_bogus_one_in(),
        }
    }
}

impl ErrorConfig {
    /// Name of the injector to run, `none` when injection is disabled.
    pub fn effective_injector(&self) -> &str {
        if self.enabled { &self.injector } else { "none" }
    }
}

/// Consumer-side settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorConfig {
    /// Render a snapshot every this many lines
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_snapshot_interval() -> u64 {
    100
}
fn default_depth() -> usize {
    DEFAULT_DEPTH
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: default_snapshot_interval(),
            depth: default_depth(),
            format: OutputFormat::default(),
        }
    }
}

/// How snapshots are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Fixed-width table
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        let g = &self.generator;
        if !g.tick_size.is_positive() {
            return Err(Error::Config("tick_size must be > 0".into()));
        }
        if !g.start_price.is_positive() {
            return Err(Error::Config("start_price must be > 0".into()));
        }
        if g.max_order_quantity < 2 {
            return Err(Error::Config("max_order_quantity must be >= 2".into()));
        }
        if g.max_orders_per_level == 0 {
            return Err(Error::Config("max_orders_per_level must be > 0".into()));
        }

        let s = &self.strategy;
        if s.event_weights.total() == 0 {
            return Err(Error::Config("event weights must not all be zero".into()));
        }
        if s.tick_move_weights.iter().all(|&w| w == 0) {
            return Err(Error::Config(
                "tick_move_weights must contain a positive weight".into(),
            ));
        }
        if g.num_levels <= s.max_tick_move() {
            return Err(Error::Config(format!(
                "num_levels ({}) must exceed the largest tick move ({})",
                g.num_levels,
                s.max_tick_move()
            )));
        }

        let e = &self.errors;
        let denominators = [
            ("duplicate_id_one_in", e.duplicate_id_one_in),
            ("bad_cancel_one_in", e.bad_cancel_one_in),
            ("field_error_one_in", e.field_error_one_in),
            ("bogus_add_one_in", e.bogus_add_one_in),
            ("bogus_trade_one_in", e.bogus_trade_one_in),
        ];
        if let Some((name, _)) = denominators.iter().find(|(_, d)| *d == 0) {
            return Err(Error::Config(format!("{name} must be > 0")));
        }

        let p = &self.processor;
        if p.snapshot_interval == 0 {
            return Err(Error::Config("snapshot_interval must be > 0".into()));
        }
        if p.depth == 0 {
            return Err(Error::Config("depth must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[generator]
start_price = "900"
tick_size = "12.5"
num_levels = 6

[strategy]
seed = 7
tick_move_weights = [1, 1]

[strategy.event_weights]
price_move = 5

[errors]
enabled = true
bogus_add_one_in = 50

[processor]
snapshot_interval = 10
format = "json"
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::parse(example_toml()).unwrap();

        assert_eq!(config.generator.tick_size, "12.5".parse().unwrap());
        assert_eq!(config.generator.num_levels, 6);
        assert_eq!(config.generator.max_order_quantity, 10);
        assert_eq!(config.strategy.seed, 7);
        assert_eq!(config.strategy.max_tick_move(), 2);
        assert_eq!(config.strategy.event_weights.price_move, 5);
        assert_eq!(config.strategy.event_weights.modify, 79);
        assert!(config.errors.enabled);
        assert_eq!(config.errors.bogus_add_one_in, 50);
        assert_eq!(config.errors.bogus_trade_one_in, 500);
        assert_eq!(config.processor.format, OutputFormat::Json);
        assert_eq!(config.processor.depth, 5);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        let g = &config.generator;

        assert_eq!(g.start_price, Price::from(900));
        assert_eq!(g.tick_size, Price::from(25));
        assert_eq!(g.num_levels, 5);
        assert_eq!(g.start_order_id, 1_000_000);
        assert_eq!(g.max_orders_per_level, 10);
        assert_eq!(g.max_order_quantity, 10);
        assert_eq!(g.tick_margin, 8);
        assert_eq!(config.strategy.name, "random");
        assert_eq!(config.strategy.seed, 113);
        assert_eq!(config.strategy.tick_move_weights, vec![6, 3, 1]);
        assert_eq!(config.strategy.event_weights.total(), 100);
        assert!(!config.errors.enabled);
        assert_eq!(config.errors.effective_injector(), "none");
        assert_eq!(config.errors.duplicate_id_one_in, 1000);
        assert_eq!(config.errors.field_error_one_in, 5000);
        assert_eq!(config.processor.format, OutputFormat::Text);
    }

    #[test]
    fn numeric_prices_are_accepted() {
        let config = Config::parse("[generator]\nstart_price = 950\n").unwrap();
        assert_eq!(config.generator.start_price, Price::from(950));
    }

    #[test]
    fn rejects_zero_tick() {
        let err = Config::parse("[generator]\ntick_size = \"0\"\n").unwrap_err();
        assert!(err.to_string().contains("tick_size"));
    }

    #[test]
    fn rejects_too_few_levels() {
        let err = Config::parse("[generator]\nnum_levels = 3\n").unwrap_err();
        assert!(err.to_string().contains("num_levels"));
    }

    #[test]
    fn rejects_small_max_quantity() {
        assert!(Config::parse("[generator]\nmax_order_quantity = 1\n").is_err());
    }

    #[test]
    fn rejects_zero_weights() {
        let toml = r#"
[strategy.event_weights]
add = 0
modify = 0
cancel = 0
price_move = 0
"#;
        assert!(Config::parse(toml).is_err());
        assert!(Config::parse("[strategy]\ntick_move_weights = []\n").is_err());
    }

    #[test]
    fn rejects_zero_denominator() {
        let err = Config::parse("[errors]\nbad_cancel_one_in = 0\n").unwrap_err();
        assert!(err.to_string().contains("bad_cancel_one_in"));
    }

    #[test]
    fn rejects_unknown_section() {
        assert!(matches!(
            Config::parse("[network]\nport = 1\n"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
