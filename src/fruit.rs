use std::{collections::HashSet, fs, path::{Path, PathBuf}};

use rand::{rngs::StdRng, seq::IteratorRandom, Rng, SeedableRng};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::grid::{Cell, GridBounds};

pub const DEFAULT_FRUITS: [&str; 4] = ["apple", "banana", "watermelon", "grapes"];

/// Fruit names shown next to the score. They never affect play.
#[derive(Clone, Debug)]
pub struct FruitCatalog {
    names: Vec<String>,
}

impl FruitCatalog {
    /// Reads one name per line, writing the default list first if the file is missing.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            info!(path = %path.display(), "writing default fruit catalog");
            let mut contents = DEFAULT_FRUITS.join("\n");
            contents.push('\n');
            fs::write(path, contents).map_err(|e| StorageError::io(path, e))?;
        }

        let text = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;

        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        if names.is_empty() {
            return Err(StorageError::EmptyCatalog { path: PathBuf::from(path) });
        }
        Ok(FruitCatalog { names })
    }

    #[cfg(test)]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        assert!(!names.is_empty(), "a catalog needs at least one fruit");
        FruitCatalog { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn name(&self, kind: usize) -> &str {
        &self.names[kind % self.names.len()]
    }
}

#[cfg(test)]
impl Default for FruitCatalog {
    fn default() -> Self {
        FruitCatalog::from_names(DEFAULT_FRUITS)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fruit {
    pub cell: Cell,
    /// Index into the session's `FruitCatalog`.
    pub kind: usize,
}

/// Whether freshly spawned fruit may land on the snake.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpawnPolicy {
    /// Any cell of the grid, snake or not.
    Anywhere,
    /// Only cells the snake does not cover.
    AvoidSnake,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        SpawnPolicy::Anywhere
    }
}

pub struct FruitSpawner {
    bounds: GridBounds,
    policy: SpawnPolicy,
    rng: StdRng,
}

impl FruitSpawner {
    pub fn new(bounds: GridBounds, policy: SpawnPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        FruitSpawner { bounds, policy, rng }
    }

    pub fn policy(&self) -> SpawnPolicy {
        self.policy
    }

    /// Picks a cell uniformly at random, honoring the spawn policy.
    pub fn spawn_cell(&mut self, occupied: &HashSet<Cell>) -> Cell {
        if self.policy == SpawnPolicy::AvoidSnake {
            let free = self.bounds.cells().filter(|c| !occupied.contains(c));
            if let Some(cell) = free.choose(&mut self.rng) {
                return cell;
            }
            warn!(cells = self.bounds.cell_count(), "no free cell left for fruit, placing it on the snake");
        }

        Cell::new(
            self.rng.gen_range(0..self.bounds.width),
            self.rng.gen_range(0..self.bounds.height),
        )
    }

    pub fn spawn(&mut self, occupied: &HashSet<Cell>, catalog: &FruitCatalog) -> Fruit {
        let cell = self.spawn_cell(occupied);
        let kind = self.rng.gen_range(0..catalog.len());
        Fruit { cell, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_catalog_is_bootstrapped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fruits.txt");
        let catalog = FruitCatalog::load(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "apple\nbanana\nwatermelon\ngrapes\n");
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.name(2), "watermelon");
    }

    #[test]
    fn existing_catalog_is_trimmed_and_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fruits.txt");
        fs::write(&path, "kiwi\n\n  mango \n").unwrap();
        let catalog = FruitCatalog::load(&path).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name(0), "kiwi");
        assert_eq!(catalog.name(1), "mango");
        assert_eq!(fs::read_to_string(&path).unwrap(), "kiwi\n\n  mango \n");
    }

    #[test]
    fn blank_catalog_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fruits.txt");
        fs::write(&path, "\n  \n").unwrap();
        assert!(matches!(FruitCatalog::load(&path), Err(StorageError::EmptyCatalog { .. })));
    }

    #[test]
    fn unreadable_catalog_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("fruits.txt");
        assert!(matches!(FruitCatalog::load(&path), Err(StorageError::Io { .. })));
    }

    #[test]
    fn same_seed_same_fruit() {
        let bounds = GridBounds::new(32, 24);
        let catalog = FruitCatalog::default();
        let mut a = FruitSpawner::new(bounds, SpawnPolicy::Anywhere, Some(7));
        let mut b = FruitSpawner::new(bounds, SpawnPolicy::Anywhere, Some(7));
        let empty = HashSet::new();
        for _ in 0..20 {
            assert_eq!(a.spawn(&empty, &catalog), b.spawn(&empty, &catalog));
        }
    }

    #[test]
    fn spawns_stay_on_the_grid() {
        let bounds = GridBounds::new(5, 3);
        let catalog = FruitCatalog::default();
        let mut spawner = FruitSpawner::new(bounds, SpawnPolicy::Anywhere, Some(1));
        for _ in 0..500 {
            let fruit = spawner.spawn(&HashSet::new(), &catalog);
            assert!(bounds.contains(fruit.cell));
            assert!(fruit.kind < catalog.len());
        }
    }

    #[test]
    fn legacy_policy_may_land_on_the_snake() {
        // Everything but one cell is occupied, so uniform draws hit the body
        let bounds = GridBounds::new(4, 4);
        let free = Cell::new(3, 3);
        let occupied: HashSet<Cell> = bounds.cells().filter(|c| *c != free).collect();
        let mut spawner = FruitSpawner::new(bounds, SpawnPolicy::Anywhere, Some(3));
        let hits = (0..100).filter(|_| occupied.contains(&spawner.spawn_cell(&occupied))).count();
        assert!(hits > 0);
    }

    #[test]
    fn avoid_policy_never_lands_on_the_snake() {
        let bounds = GridBounds::new(4, 4);
        let free = Cell::new(3, 3);
        let occupied: HashSet<Cell> = bounds.cells().filter(|c| *c != free).collect();
        let mut spawner = FruitSpawner::new(bounds, SpawnPolicy::AvoidSnake, Some(3));
        for _ in 0..50 {
            assert_eq!(spawner.spawn_cell(&occupied), free);
        }
    }

    #[test]
    fn avoid_policy_falls_back_when_the_board_is_full() {
        let bounds = GridBounds::new(2, 2);
        let occupied: HashSet<Cell> = bounds.cells().collect();
        let mut spawner = FruitSpawner::new(bounds, SpawnPolicy::AvoidSnake, Some(3));
        assert!(bounds.contains(spawner.spawn_cell(&occupied)));
    }

    #[test]
    fn kind_wraps_around_the_catalog() {
        let catalog = FruitCatalog::from_names(["pear"]);
        assert_eq!(catalog.name(5), "pear");
    }
}
