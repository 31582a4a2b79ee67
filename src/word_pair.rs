use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::player::Role;


#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct WordPair {
    pub common: String,
    pub undercover: String,
}

impl WordPair {
    pub fn new(common: impl Into<String>, undercover: impl Into<String>) -> Self {
        WordPair { common: common.into(), undercover: undercover.into() }
    }

    pub fn word_for(&self, role: Role) -> &str {
        match role {
            Role::Normal => &self.common,
            Role::Undercover => &self.undercover,
        }
    }
}


const BUILTIN_PAIRS: &[(&str, &str)] = &[
    ("Reiseleiter", "Orientierung"),
    ("Stand-Up", "Mikrofon"),
    ("Gabel", "Aufheben"),
    ("Gepäckband", "Drehung"),
    ("Ausreise", "Abschied"),
    ("Bleistift", "Skizzieren"),
    ("Radio", "Übertragen"),
    ("Broadway", "Show"),
    ("Topf", "Rühren"),
    ("Urlaubsort", "Erholung"),
    ("Ankunft", "Landung"),
    ("Fensterplatz", "Ausblick"),
    ("Bibliothek", "Stille"),
    ("Kamera", "Blitz"),
    ("Zugticket", "Abfahrt"),
    ("Fußball", "Rollen"),
    ("Theater", "Vorhang"),
    ("Spiegel", "Reflexion"),
    ("Kochbuch", "Zutaten"),
    ("Tankstelle", "Zapfen"),
    ("Kopfhörer", "Abschalten"),
    ("Leiter", "Höhe"),
    ("Schlüssel", "Schloss"),
    ("Taxi", "Fahrt"),
    ("Regenschirm", "Tropfen"),
    ("Schneemann", "Kälte"),
    ("Bäckerei", "Duft"),
    ("Straßenkarte", "Weg"),
    ("Einkaufswagen", "Schieben"),
    ("Kletterwand", "Griff"),
    ("Wäscheleine", "Trocknen"),
    ("Mona Lisa", "Lächeln"),
    ("Zeitschaltuhr", "Timer"),
    ("Küche", "Kochen"),
    ("StarWars", "Weltraum"),
    ("Controller", "Knöpfe"),
    ("Musikvideo", "Szenen"),
    ("Haar", "Styling"),
    ("Rundreise", "Stationen"),
];

// Static word-pair catalog. Never empty, so a round can always pick a pair.
#[derive(Clone, Debug)]
pub struct WordPairCatalog {
    pairs: Vec<WordPair>,
}

impl WordPairCatalog {
    pub fn new(pairs: Vec<WordPair>) -> Option<Self> {
        if pairs.is_empty() { None } else { Some(WordPairCatalog { pairs }) }
    }

    pub fn builtin() -> Self {
        WordPairCatalog {
            pairs: BUILTIN_PAIRS.iter().map(|&(c, u)| WordPair::new(c, u)).collect(),
        }
    }

    pub fn pairs(&self) -> &[WordPair] { &self.pairs }

    // Uniform choice over the whole catalog.
    pub fn choose(&self, rng: &mut impl Rng) -> WordPair {
        self.pairs[rng.random_range(0..self.pairs.len())].clone()
    }
}
