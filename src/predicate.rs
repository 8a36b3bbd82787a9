/*******************************************************************************
 * Copyright (c) 2024 Cénotélie Opérations SAS (cenotelie.fr)
 ******************************************************************************/

//! Acceptance predicates for consumers

use core::fmt::Display;
use core::str::FromStr;

use serde::Deserialize;

use crate::errors::ConfigError;

/// The acceptance criterion of a consumer.
/// Implementations must be pure, total and deterministic.
pub trait Predicate: Send + Sync {
    /// Gets whether the item is accepted
    fn accepts(&self, item: i64) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(i64) -> bool + Send + Sync,
{
    #[inline]
    fn accepts(&self, item: i64) -> bool {
        self(item)
    }
}

/// The built-in predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum PredicateKind {
    /// Accepts even numbers
    Even,
    /// Accepts odd numbers
    Odd,
    /// Accepts prime numbers
    Prime,
    /// Accepts everything, used for a default consumer collecting what no one else wants
    Any,
}

impl PredicateKind {
    /// All the built-in predicates
    pub const ALL: [Self; 4] = [Self::Even, Self::Odd, Self::Prime, Self::Any];

    /// Gets the name of the predicate
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Even => "even",
            Self::Odd => "odd",
            Self::Prime => "prime",
            Self::Any => "any",
        }
    }

    /// Gets whether a set of predicates accepts every integer
    #[must_use]
    pub fn covers_all<I: IntoIterator<Item = Self>>(kinds: I) -> bool {
        let (mut even, mut odd) = (false, false);
        for kind in kinds {
            match kind {
                Self::Any => return true,
                Self::Even => even = true,
                Self::Odd => odd = true,
                Self::Prime => {}
            }
        }
        even && odd
    }
}

impl Predicate for PredicateKind {
    fn accepts(&self, item: i64) -> bool {
        match self {
            Self::Even => item % 2 == 0,
            Self::Odd => item % 2 != 0,
            Self::Prime => is_prime(item),
            Self::Any => true,
        }
    }
}

impl Display for PredicateKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PredicateKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "even" | "pares" => Ok(Self::Even),
            "odd" | "impares" => Ok(Self::Odd),
            "prime" | "primos" => Ok(Self::Prime),
            "any" | "all" => Ok(Self::Any),
            _ => Err(ConfigError::UnknownPredicate(s.to_string())),
        }
    }
}

impl TryFrom<String> for PredicateKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Tests whether a number is prime, using trial division by 6k ± 1
#[must_use]
pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5_i64;
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}
