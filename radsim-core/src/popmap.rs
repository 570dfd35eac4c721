use std::io::prelude::*;
use std::path::Path;

use anyhow::{Context, Result};

use crate::utils::{create_writer, digits, get_dynamic_reader};

///
/// Population map: ordered samples and the population each belongs to.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopMap {
    pub entries: Vec<(String, String)>,
}

impl PopMap {
    ///
    /// Read a `sample<TAB>population` file. The population column is optional.
    ///
    pub fn from_file(path: &Path) -> Result<Self> {
        let reader = get_dynamic_reader(path)?;
        let mut entries = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("Failed reading line {} of {:?}", i + 1, path))?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let sample = fields.next().unwrap_or_default().to_string();
            let population = fields.next().unwrap_or_default().to_string();
            entries.push((sample, population));
        }
        Ok(PopMap { entries })
    }

    ///
    /// Build the map for `sizes[j]` samples in each population `j`, named
    /// `msp_{i}` and `pop{j}` zero-padded to the largest index.
    ///
    pub fn from_population_sizes(sizes: &[usize]) -> Self {
        let n_samples: usize = sizes.iter().sum();
        if n_samples == 0 {
            return PopMap::default();
        }
        let last_pop = sizes
            .iter()
            .rposition(|&s| s > 0)
            .unwrap_or_default();
        let pad_s = digits(n_samples - 1);
        let pad_p = digits(last_pop);

        let mut entries = Vec::with_capacity(n_samples);
        let mut sample = 0;
        for (pop, &size) in sizes.iter().enumerate() {
            for _ in 0..size {
                entries.push((
                    format!("msp_{:0width$}", sample, width = pad_s),
                    format!("pop{:0width$}", pop, width = pad_p),
                ));
                sample += 1;
            }
        }
        PopMap { entries }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = create_writer(path)?;
        for (sample, pop) in &self.entries {
            writeln!(writer, "{}\t{}", sample, pop)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn samples(&self) -> Vec<String> {
        self.entries.iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
