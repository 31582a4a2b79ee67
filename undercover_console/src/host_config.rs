use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use undercover::rules::Rules;
use undercover::word_pair::{WordPair, WordPairCatalog};

use crate::network;


#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    pub listen_address: String,
    pub min_players: usize,
    #[serde(with = "humantime_serde")]
    pub discussion_time_per_player: Duration,
    // YAML list of `{common, undercover}` objects. Built-in German catalog if missing.
    pub word_pairs_file: Option<String>,
    // Makes role, word and tie-break choices reproducible.
    pub seed: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        let rules = Rules::default();
        HostConfig {
            listen_address: format!("0.0.0.0:{}", network::PORT),
            min_players: rules.min_players,
            discussion_time_per_player: rules.discussion_time_per_player,
            word_pairs_file: None,
            seed: None,
        }
    }
}

impl HostConfig {
    pub fn rules(&self) -> anyhow::Result<Rules> {
        if self.discussion_time_per_player < Duration::from_secs(1) {
            bail!("Discussion time per player must be at least one second");
        }
        if self.min_players < 2 {
            bail!("A round needs at least two players");
        }
        Ok(Rules {
            min_players: self.min_players,
            discussion_time_per_player: Duration::from_secs(
                self.discussion_time_per_player.as_secs(),
            ),
        })
    }

    pub fn word_pairs(&self) -> anyhow::Result<WordPairCatalog> {
        let Some(filename) = &self.word_pairs_file else {
            return Ok(WordPairCatalog::builtin());
        };
        let contents = std::fs::read_to_string(filename)
            .with_context(|| format!("Cannot read word pairs file '{filename}'"))?;
        parse_word_pairs(&contents).with_context(|| format!("Invalid word pairs file '{filename}'"))
    }
}

fn parse_word_pairs(contents: &str) -> anyhow::Result<WordPairCatalog> {
    let pairs: Vec<WordPair> = serde_yaml::from_str(contents)?;
    WordPairCatalog::new(pairs).context("Word pair list is empty")
}
