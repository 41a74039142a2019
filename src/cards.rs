//! Sample records served by the demo source.

use serde::{Deserialize, Serialize};

/// A list card as rendered by a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub title: String,
    pub header: String,
    pub content: String,
}

const FILLER: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
Sed ac luctus sem. Nam nec neque arcu. Vivamus nec semper tellus, sed lobortis metus.";

pub fn sample_cards() -> Vec<Card> {
    (1..=2)
        .map(|id| Card {
            id,
            title: format!("List Item {id} Title"),
            header: format!("List Item {id}"),
            content: FILLER.to_string(),
        })
        .collect()
}
