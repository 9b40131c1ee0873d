/// Flat-file JSON challenge store under the cache directory
use crate::config::types::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File holding every known challenge as one JSON array
pub const CHALLENGES_FILE: &str = "challenges.json";

/// File solutions read their puzzle input from
pub const INPUT_FILE: &str = "input.txt";

/// One puzzle part, optionally with a reference solution and its answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub name: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub solution_lang: String,
    #[serde(default)]
    pub year: i64,
    #[serde(default)]
    pub answer: String,
}

/// `day{day}_part{part}_{year}`
pub fn challenge_name(day: u32, part: u32, year: u32) -> String {
    format!("day{}_part{}_{}", day, part, year)
}

/// Write the challenge input to `<dir>/input.txt`.
pub fn write_input_file(dir: &Path, challenge: &Challenge) -> Result<PathBuf> {
    let path = dir.join(INPUT_FILE);
    std::fs::write(&path, &challenge.input)?;
    Ok(path)
}

#[derive(Debug, Clone)]
pub struct ChallengeStore {
    cache_dir: PathBuf,
}

impl ChallengeStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(CHALLENGES_FILE)
    }

    /// All challenges; a missing file is an empty store.
    pub fn load(&self) -> Result<Vec<Challenge>> {
        let path = self.path();
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, challenges: &[Challenge]) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            EvalError::Config(format!(
                "failed to create cache directory {}: {}",
                self.cache_dir.display(),
                e
            ))
        })?;
        let data = serde_json::to_string_pretty(challenges)?;
        std::fs::write(self.path(), data)?;
        Ok(())
    }

    pub fn find(&self, name: &str) -> Result<Challenge> {
        self.load()?
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| EvalError::ChallengeNotFound(name.to_string()))
    }

    /// Replace the entry with the same name and language, or append.
    pub fn upsert(&self, challenge: Challenge) -> Result<()> {
        let mut challenges = self.load()?;
        match challenges
            .iter_mut()
            .find(|c| c.name == challenge.name && c.solution_lang == challenge.solution_lang)
        {
            Some(existing) => *existing = challenge,
            None => challenges.push(challenge),
        }
        self.save(&challenges)
    }

    /// Sorted `(name, language)` pairs; unsolved entries list as "unsolved".
    pub fn listing(&self) -> Result<Vec<(String, String)>> {
        let mut by_name: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for challenge in self.load()? {
            let lang = if challenge.solution_lang.is_empty() {
                "unsolved".to_string()
            } else {
                challenge.solution_lang
            };
            by_name.entry(challenge.name).or_default().push(lang);
        }

        Ok(by_name
            .into_iter()
            .flat_map(|(name, mut langs)| {
                langs.sort();
                langs.into_iter().map(move |lang| (name.clone(), lang))
            })
            .collect())
    }
}
