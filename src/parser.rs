use crate::ir::{People, Person};
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("person graph is neither valid JSON ({json}) nor JSON5 ({json5})")]
    Syntax { json: String, json5: String },
    #[error("person record #{index} has an empty id")]
    MissingId { index: usize },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PeopleDocument {
    Map(BTreeMap<String, Person>),
    List(Vec<Person>),
}

/// Decodes a person graph: either an object keyed by id, as served by the
/// tree API, or a plain array of records.
pub fn parse_people(input: &str) -> Result<People, ParseError> {
    let document = match serde_json::from_str::<PeopleDocument>(input) {
        Ok(document) => document,
        Err(json_err) => json5::from_str::<PeopleDocument>(input).map_err(|json5_err| {
            ParseError::Syntax {
                json: json_err.to_string(),
                json5: json5_err.to_string(),
            }
        })?,
    };

    let mut people = People::new();
    match document {
        PeopleDocument::Map(map) => {
            for (key, mut person) in map {
                person.id = key.clone();
                people.insert(key, person);
            }
        }
        PeopleDocument::List(list) => {
            for (index, person) in list.into_iter().enumerate() {
                let id = person.id.trim().to_string();
                if id.is_empty() {
                    return Err(ParseError::MissingId { index });
                }
                people.insert(id, person);
            }
        }
    }
    Ok(people)
}
