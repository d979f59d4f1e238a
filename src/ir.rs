use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(-?\d{1,4})").unwrap());

/// Person records keyed by id. Id order is the engine's iteration order.
pub type People = BTreeMap<String, Person>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Diverse,
    #[default]
    Unknown,
}

impl Sex {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            "diverse" | "d" => Self::Diverse,
            _ => Self::Unknown,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Male => '♂',
            Self::Female => '♀',
            Self::Diverse => '⚥',
            Self::Unknown => '?',
        }
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Sex::from_token).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub sex: Sex,
    #[serde(deserialize_with = "empty_as_none")]
    pub birth: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub death: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub photo: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub parents: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub children: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub spouses: Vec<String>,
}

impl Person {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn birth_year(&self) -> Option<i32> {
        year_of(self.birth.as_deref()?)
    }

    /// Text shown on the node's first line.
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.sex.symbol())
    }

    /// Life span line, e.g. `*1950 †2020` or `*1980`.
    pub fn life_span(&self) -> String {
        if self.birth.is_none() && self.death.is_none() {
            return String::new();
        }
        let year = |date: Option<&str>| {
            date.and_then(year_of)
                .map(|y| y.to_string())
                .unwrap_or_else(|| "?".to_string())
        };
        let born = year(self.birth.as_deref());
        match self.death.as_deref() {
            Some(death) => format!("*{} †{}", born, year(Some(death))),
            None => format!("*{}", born),
        }
    }
}

fn year_of(date: &str) -> Option<i32> {
    YEAR_RE
        .captures(date)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.trim().is_empty()))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}

/// Incremental construction of a [`People`] map with reciprocal links.
#[derive(Debug, Default, Clone)]
pub struct PeopleBuilder {
    people: People,
}

impl PeopleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(mut self, id: &str, name: &str, sex: Sex) -> Self {
        let entry = self.ensure(id);
        entry.name = name.to_string();
        entry.sex = sex;
        self
    }

    pub fn born(mut self, id: &str, date: &str) -> Self {
        self.ensure(id).birth = Some(date.to_string());
        self
    }

    pub fn died(mut self, id: &str, date: &str) -> Self {
        self.ensure(id).death = Some(date.to_string());
        self
    }

    pub fn photo(mut self, id: &str, photo: &str) -> Self {
        self.ensure(id).photo = Some(photo.to_string());
        self
    }

    pub fn spouses(mut self, a: &str, b: &str) -> Self {
        push_unique(&mut self.ensure(a).spouses, b);
        push_unique(&mut self.ensure(b).spouses, a);
        self
    }

    pub fn child(mut self, parent: &str, child: &str) -> Self {
        push_unique(&mut self.ensure(parent).children, child);
        push_unique(&mut self.ensure(child).parents, parent);
        self
    }

    /// Records `child` as the child of both `a` and `b`.
    pub fn couple_child(self, a: &str, b: &str, child: &str) -> Self {
        self.child(a, child).child(b, child)
    }

    pub fn build(self) -> People {
        self.people
    }

    fn ensure(&mut self, id: &str) -> &mut Person {
        self.people
            .entry(id.to_string())
            .or_insert_with(|| Person::new(id, id))
    }
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
