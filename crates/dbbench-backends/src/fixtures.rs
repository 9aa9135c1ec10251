//! Test data generation for benchmarks.
//!
//! Seed data is deterministic so two runs against the same vendor load the
//! same rows. Per-attempt data (new users, lookup keys) comes from a seeded
//! [`DataGen`], one per backend.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Lowest generated user age.
pub const MIN_AGE: i32 = 18;

/// Highest generated user age.
pub const MAX_AGE: i32 = 80;

/// Amount of seed data loaded before benchmarking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// 10 users, 5 posts. Use for tests.
    Tiny,
    /// 100 users, 50 posts.
    Small,
    /// 1,000 users, 50 posts.
    #[default]
    Medium,
    /// 10,000 users, 500 posts.
    Large,
}

impl Scale {
    /// Get the user count for this scale.
    pub fn users(&self) -> usize {
        match self {
            Scale::Tiny => 10,
            Scale::Small => 100,
            Scale::Medium => 1_000,
            Scale::Large => 10_000,
        }
    }

    /// Get the post count for this scale.
    ///
    /// Posts go to the first users only, so joins see both users with and
    /// without posts.
    pub fn posts(&self) -> usize {
        match self {
            Scale::Tiny => 5,
            Scale::Small | Scale::Medium => 50,
            Scale::Large => 500,
        }
    }
}

/// User row data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub name: String,
    pub email: String,
    pub age: i32,
}

/// Post row data. `author` indexes into the seed users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostData {
    pub author: usize,
    pub title: String,
    pub content: String,
}

/// Generate a random alphanumeric string of the given length.
fn random_string(rng: &mut StdRng, len: usize) -> String {
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}

/// Generate seed users with unique emails.
pub fn generate_users(count: usize) -> Vec<UserData> {
    const SEED: u64 = 12345;
    let mut rng = StdRng::seed_from_u64(SEED);

    (0..count)
        .map(|i| UserData {
            name: format!("User_{}", i),
            email: format!("user{}@example{}.com", i, i % 10),
            age: rng.gen_range(MIN_AGE..=MAX_AGE),
        })
        .collect()
}

/// Generate seed posts, assigned round-robin to the first `authors` users.
pub fn generate_posts(count: usize, authors: usize) -> Vec<PostData> {
    const SEED: u64 = 54321;
    let mut rng = StdRng::seed_from_u64(SEED);

    if authors == 0 {
        return Vec::new();
    }

    (0..count)
        .map(|i| PostData {
            author: i % authors,
            title: format!("Post_{}", i),
            content: random_string(&mut rng, 200),
        })
        .collect()
}

/// Seeded source of per-attempt data.
#[derive(Debug)]
pub struct DataGen {
    rng: StdRng,
    sequence: u64,
}

impl DataGen {
    /// Create a generator from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sequence: 0,
        }
    }

    /// A new user whose email differs from every seed user and every
    /// earlier user from this generator.
    pub fn user(&mut self) -> UserData {
        self.sequence += 1;
        let seq = self.sequence;
        UserData {
            name: format!("User_{}", seq),
            email: format!(
                "{}.{}@{}.com",
                random_string(&mut self.rng, 8),
                seq,
                random_string(&mut self.rng, 6)
            ),
            age: self.age(),
        }
    }

    /// A batch of new users.
    pub fn users(&mut self, count: usize) -> Vec<UserData> {
        (0..count).map(|_| self.user()).collect()
    }

    /// A random age in `MIN_AGE..=MAX_AGE`.
    pub fn age(&mut self) -> i32 {
        self.rng.gen_range(MIN_AGE..=MAX_AGE)
    }

    /// A random `(low, high)` age window for range queries.
    pub fn age_window(&mut self) -> (i32, i32) {
        (self.rng.gen_range(MIN_AGE..=40), self.rng.gen_range(41..=MAX_AGE))
    }

    /// A random index into a collection of `len` items.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.rng.gen_range(0..len))
    }

    /// A random element of `items`.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }
}
