//! Read-only registries keyed by code or ID
//!
//! A registry keeps records in load order (routing tie-breaks depend on
//! it) plus a hash index for lookups. Registries are never mutated after
//! construction, so any number of readers can share one without locking.

use crate::types::{Corridor, Currency, Federation};
use crate::{Error, Result};
use std::collections::HashMap;

/// A record addressable by a unique key
pub trait Keyed {
    /// Registry kind, used in error messages
    const KIND: &'static str;

    /// Unique key
    fn key(&self) -> &str;
}

impl Keyed for Currency {
    const KIND: &'static str = "currency";

    fn key(&self) -> &str {
        &self.code
    }
}

impl Keyed for Corridor {
    const KIND: &'static str = "corridor";

    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for Federation {
    const KIND: &'static str = "federation";

    fn key(&self) -> &str {
        &self.id
    }
}

/// Ordered, indexed, immutable collection
#[derive(Debug, Clone)]
pub struct Registry<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: Keyed> Registry<T> {
    /// Build from records in load order; keys must be unique and non-empty
    pub fn new(entries: Vec<T>) -> Result<Self> {
        let mut index = HashMap::with_capacity(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            let key = entry.key();
            if key.trim().is_empty() {
                return Err(Error::Invalid(format!("{} with empty key", T::KIND)));
            }
            if index.insert(key.to_string(), position).is_some() {
                return Err(Error::Invalid(format!("duplicate {} '{}'", T::KIND, key)));
            }
        }

        Ok(Self { entries, index })
    }

    /// Look up by key
    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    /// All records, in load order
    pub fn all(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Currency registry
pub type CurrencyRegistry = Registry<Currency>;

/// Corridor registry
pub type CorridorRegistry = Registry<Corridor>;

/// Federation registry
pub type FederationRegistry = Registry<Federation>;

impl Registry<Currency> {
    /// Look up a currency, failing with `CurrencyNotFound`
    pub fn lookup(&self, code: &str) -> Result<&Currency> {
        self.get(code)
            .ok_or_else(|| Error::CurrencyNotFound(code.to_string()))
    }

    /// Primary currency of a country: first registered currency it issues
    pub fn primary_for_country(&self, country: &str) -> Option<&Currency> {
        self.all().find(|currency| currency.country == country)
    }
}

impl Registry<Corridor> {
    /// Look up a corridor, failing with `CorridorNotFound`
    pub fn lookup(&self, id: &str) -> Result<&Corridor> {
        self.get(id)
            .ok_or_else(|| Error::CorridorNotFound(id.to_string()))
    }

    /// Corridors that include `country`, in registry order
    pub fn containing_country<'a>(
        &'a self,
        country: &'a str,
    ) -> impl Iterator<Item = &'a Corridor> + 'a {
        self.all().filter(move |corridor| corridor.has_country(country))
    }

    /// Check if the two countries share at least one corridor
    pub fn share_corridor(&self, from_country: &str, to_country: &str) -> bool {
        self.all()
            .any(|corridor| corridor.connects(from_country, to_country))
    }
}

impl Registry<Federation> {
    /// Look up a federation, failing with `FederationNotFound`
    pub fn lookup(&self, id: &str) -> Result<&Federation> {
        self.get(id)
            .ok_or_else(|| Error::FederationNotFound(id.to_string()))
    }
}
